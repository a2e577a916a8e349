//! # Codec
//!
//! This crate turns a value graph into a single text payload and back.
//!
//! ## Philosophy
//!
//! - **Pluggable**: Endpoints depend on the [`Codec`] trait, not on a format
//! - **Lossless**: [`TaggedJsonCodec`] round-trips every [`Value`] variant
//! - **Stateless**: Codecs hold no state and never perform I/O
//!
//! ## Contract
//!
//! `decode(encode(v))` must equal `v` for every value the codec accepts.
//! A codec may refuse to encode values it cannot represent, but it must
//! report that as an error rather than silently changing the value.
//!
//! ## Limits
//!
//! - Big integers are held as `i128`. A peer bigint outside that range fails
//!   to decode, and with it the whole envelope carrying it; a result lost
//!   this way reaches the caller as a timeout.
//! - Object keys are kept sorted, not in insertion order. Peers that depend
//!   on key order should send a map instead.

pub mod error;
pub mod plain_json;
pub mod tagged_json;
pub mod value;

pub use error::CodecError;
pub use plain_json::JsonCodec;
pub use tagged_json::{TaggedJsonCodec, TYPE_TAG};
pub use value::{from_value, to_value, Value};

/// Serializer for envelope payloads
pub trait Codec {
    /// Encodes a value into one text payload
    fn encode(&self, value: &Value) -> Result<String, CodecError>;

    /// Decodes one text payload
    fn decode(&self, raw: &str) -> Result<Value, CodecError>;
}
