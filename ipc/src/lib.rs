//! # Envelope Protocol
//!
//! This crate defines the messages two postbridge endpoints exchange and the
//! transport contract they are exchanged over.
//!
//! ## Philosophy
//!
//! - **Messages, not shared state**: Contexts only ever see opaque text
//! - **Typed, not stringly-typed**: Envelope kinds and event keys are enums
//! - **Scoped**: Every envelope names the channel it belongs to
//! - **Forward compatible**: Unknown envelope kinds decode instead of failing
//!
//! ## Architecture
//!
//! Every envelope carries:
//! - A `type`: `broadcast`, `function:<name>` or `functionResult`
//! - A `channel` key scoping which endpoints may interoperate
//! - Variant fields: broadcast data, call id and arguments, or a result
//!
//! Errors crossing contexts travel as [`ErrorDescriptor`] data.

pub mod channel;
pub mod descriptor;
pub mod envelope;
pub mod error;
pub mod transport;

pub use channel::{ChannelKey, CHANNEL_KEY_PREFIX};
pub use descriptor::{ErrorCode, ErrorDescriptor};
pub use envelope::{
    Envelope, EventKey, BROADCAST_TYPE, FUNCTION_PREFIX, FUNCTION_RESULT_TYPE,
};
pub use error::{EnvelopeError, TransportError};
pub use transport::{
    inbound_channel, InboundMessage, InboundSink, InboundStream, MessageHost, MessageTarget,
    WeakInboundSink,
};
