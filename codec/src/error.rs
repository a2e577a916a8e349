//! Codec error types

use thiserror::Error;

/// Errors raised while encoding or decoding a payload
#[derive(Debug, Error)]
pub enum CodecError {
    /// The text is not valid JSON, or a typed conversion failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A tagged object carried a tag this codec does not know
    #[error("Unknown type tag: {0}")]
    UnknownTag(String),

    /// A tagged object was recognised but its contents were invalid
    #[error("Malformed {tag} value: {reason}")]
    Malformed { tag: &'static str, reason: String },

    /// The value has no plain JSON representation
    #[error("Value of type {0} is not representable as JSON")]
    NotRepresentable(&'static str),
}

impl CodecError {
    pub(crate) fn malformed(tag: &'static str, reason: impl Into<String>) -> Self {
        Self::Malformed {
            tag,
            reason: reason.into(),
        }
    }
}
