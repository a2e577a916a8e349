//! Envelope and transport error types

use codec::CodecError;
use thiserror::Error;

/// Errors raised while building or reading an envelope
#[derive(Debug, Error)]
pub enum EnvelopeError {
    /// Payload could not be encoded or decoded
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// Decoded payload is not an object
    #[error("Envelope is not an object")]
    NotAnObject,

    /// A required field is absent
    #[error("Missing field: {0}")]
    MissingField(&'static str),

    /// A field has the wrong shape
    #[error("Invalid field {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

impl EnvelopeError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            reason: reason.into(),
        }
    }
}

/// Errors raised by a transport adapter
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The remote context is gone
    #[error("Transport closed")]
    Closed,

    /// The transport refused the message
    #[error("Message rejected: {0}")]
    Rejected(String),
}
