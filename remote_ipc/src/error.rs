//! Endpoint, call and listener error types

use codec::CodecError;
use ipc::{EnvelopeError, ErrorDescriptor, EventKey, TransportError};
use std::fmt;
use thiserror::Error;

/// Errors returned synchronously by endpoint operations
#[derive(Debug, Error)]
pub enum EndpointError {
    /// No target reference was supplied at construction
    #[error("Target reference is required")]
    MissingTarget,

    /// Configuration failed validation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration text could not be parsed
    #[error("Configuration parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// `supportEvaluate` is set but no evaluator was supplied
    #[error("Remote evaluation is enabled but no evaluator was provided")]
    MissingEvaluator,

    /// A function listener is already registered under this key
    #[error("Listener already exists for {0}")]
    DuplicateListener(EventKey),

    /// Broadcast listener offered for a function key, or the reverse
    #[error("Listener kind does not match key {0}")]
    ListenerKindMismatch(EventKey),

    /// Outbound envelope could not be encoded
    #[error("Envelope error: {0}")]
    Envelope(#[from] EnvelopeError),

    /// Transport refused the outbound message
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// The endpoint has been closed
    #[error("Endpoint is closed")]
    Closed,
}

/// Errors that settle a remote call
#[derive(Debug, Error)]
pub enum CallError {
    /// No result arrived within the configured timeout
    #[error("Remote call {function} timed out after {elapsed_ms}ms")]
    Timeout { function: String, elapsed_ms: u64 },

    /// The peer reported an error
    #[error("Remote call {function} failed: {error}")]
    Remote {
        function: String,
        error: ErrorDescriptor,
    },

    /// The pending-call table is full
    #[error("Too many pending calls (limit {limit})")]
    TooManyPending { limit: usize },

    /// The call envelope could not be encoded
    #[error("Envelope error: {0}")]
    Envelope(#[from] EnvelopeError),

    /// Transport refused the call envelope
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// The result did not have the requested shape
    #[error("Result type mismatch: {0}")]
    ResultType(CodecError),

    /// The endpoint closed before the call settled
    #[error("Endpoint closed before {function} settled")]
    Closed { function: String },
}

impl CallError {
    /// Returns the remote descriptor if the peer reported the error
    pub fn remote_error(&self) -> Option<&ErrorDescriptor> {
        match self {
            CallError::Remote { error, .. } => Some(error),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, CallError::Timeout { .. })
    }
}

/// Error returned by a user listener
///
/// Only the message crosses to the remote caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerError {
    message: String,
}

impl ListenerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ListenerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ListenerError {}

impl From<&str> for ListenerError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for ListenerError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<CodecError> for ListenerError {
    fn from(err: CodecError) -> Self {
        Self::new(err.to_string())
    }
}

/// Result type returned by listeners
pub type ListenerResult<T> = Result<T, ListenerError>;
