//! # Remote Endpoint
//!
//! Broadcast and request/response calls between two isolated contexts that
//! can only exchange text messages.
//!
//! ## Philosophy
//!
//! - **Explicit wiring**: The host and target contexts are handed in, never
//!   discovered
//! - **Every call settles**: A call ends in a result, a remote error, a
//!   timeout or a close, and only once
//! - **Quiet on foreign traffic**: Messages for another channel or origin
//!   are dropped without a reply
//! - **Single-threaded**: Endpoints live on one thread inside a
//!   [`tokio::task::LocalSet`]
//!
//! ## Architecture
//!
//! An [`Endpoint`] owns:
//! - A [`ListenerRegistry`] of broadcast and function listeners
//! - A [`PendingCalls`] table of outbound calls awaiting results
//! - A subscription on the host whose inbound queue a pump task drains
//!
//! ```ignore
//! let endpoint = Endpoint::builder(host)
//!     .with_target(target)
//!     .with_config(EndpointConfig::new().with_channel("c1"))
//!     .build()?;
//!
//! endpoint.on_function_sync("double", |args| {
//!     let n: i64 = codec::from_value(args[0].clone())?;
//!     Ok(Value::from(n * 2))
//! })?;
//!
//! let ten = peer.call("double", vec![Value::from(5)]).await?;
//! ```

pub mod config;
mod dispatch;
pub mod endpoint;
pub mod error;
pub mod evaluate;
pub mod pending;
pub mod registry;

pub use config::{EndpointConfig, DEFAULT_FUNCTION_TIMEOUT_MS};
pub use endpoint::{Endpoint, EndpointBuilder, WeakEndpoint};
pub use error::{CallError, EndpointError, ListenerError, ListenerResult};
pub use evaluate::{invocation_source, Evaluator, EVALUATE_FUNCTION};
pub use pending::{CallOutcome, PendingCalls};
pub use registry::{BroadcastFn, FunctionFn, Listener, ListenerId, ListenerRegistry};

pub use codec::Value;
pub use ipc::{ErrorCode, ErrorDescriptor, EventKey};
