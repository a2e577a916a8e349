//! Structured errors carried inside `functionResult` envelopes.
//!
//! Cross-context failures never raise on the side where they happen; they
//! travel back to the caller as data and are re-raised there.

use crate::EventKey;
use codec::Value;
use std::fmt;

/// Error codes for structured failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// The peer has no listener for the requested function
    NoListener,
    /// The peer's listener ran and failed
    ListenerFailed,
    /// The peer could not encode its result
    Serialization,
    /// Any error the peer reported without a recognised code
    Remote,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::NoListener => "no_listener",
            ErrorCode::ListenerFailed => "listener_failed",
            ErrorCode::Serialization => "serialization",
            ErrorCode::Remote => "remote",
        }
    }

    fn parse(code: &str) -> Self {
        match code {
            "no_listener" => ErrorCode::NoListener,
            "listener_failed" => ErrorCode::ListenerFailed,
            "serialization" => ErrorCode::Serialization,
            _ => ErrorCode::Remote,
        }
    }
}

/// Structured remote error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorDescriptor {
    pub code: ErrorCode,
    pub message: String,
    pub details: Option<String>,
}

impl ErrorDescriptor {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Error returned when a call names a function nobody listens for
    pub fn no_listener(key: &EventKey) -> Self {
        Self::new(ErrorCode::NoListener, format!("no listener for {}", key))
    }

    pub fn listener_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ListenerFailed, message)
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Serialization, message)
    }

    /// Wire form: `{code, message, details?}`
    pub fn to_value(&self) -> Value {
        let mut fields = vec![
            ("code", Value::from(self.code.as_str())),
            ("message", Value::from(self.message.as_str())),
        ];
        if let Some(details) = &self.details {
            fields.push(("details", Value::from(details.as_str())));
        }
        Value::object(fields)
    }

    /// Reads a descriptor sent by a peer
    ///
    /// Peers that are not this crate may send a bare string or an object
    /// carrying only `message`; both map to [`ErrorCode::Remote`].
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::String(message) => Self::new(ErrorCode::Remote, message.clone()),
            Value::Object(fields) => {
                let code = fields
                    .get("code")
                    .and_then(Value::as_str)
                    .map(ErrorCode::parse)
                    .unwrap_or(ErrorCode::Remote);
                let message = fields
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("remote error")
                    .to_string();
                let details = fields
                    .get("details")
                    .and_then(Value::as_str)
                    .map(str::to_string);
                Self {
                    code,
                    message,
                    details,
                }
            }
            other => Self::new(
                ErrorCode::Remote,
                format!("remote error of type {}", other.type_name()),
            ),
        }
    }
}

impl fmt::Display for ErrorDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.details {
            Some(details) => write!(f, "{} ({})", self.message, details),
            None => f.write_str(&self.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_listener_names_the_key() {
        let error = ErrorDescriptor::no_listener(&EventKey::function("missingFn"));
        assert_eq!(error.code, ErrorCode::NoListener);
        assert_eq!(error.message, "no listener for function:missingFn");
    }

    #[test]
    fn test_descriptor_value_roundtrip() {
        let error = ErrorDescriptor::listener_failed("boom").with_details("stack");
        assert_eq!(ErrorDescriptor::from_value(&error.to_value()), error);
    }

    #[test]
    fn test_lenient_foreign_errors() {
        let from_string = ErrorDescriptor::from_value(&Value::from("plain failure"));
        assert_eq!(from_string.code, ErrorCode::Remote);
        assert_eq!(from_string.message, "plain failure");

        let from_object =
            ErrorDescriptor::from_value(&Value::object([("message", Value::from("oops"))]));
        assert_eq!(from_object.code, ErrorCode::Remote);
        assert_eq!(from_object.message, "oops");

        let unknown_code = ErrorDescriptor::from_value(&Value::object([
            ("code", Value::from("E_WEIRD")),
            ("message", Value::from("x")),
        ]));
        assert_eq!(unknown_code.code, ErrorCode::Remote);

        let from_number = ErrorDescriptor::from_value(&Value::from(3));
        assert!(from_number.message.contains("number"));
    }

    #[test]
    fn test_display_includes_details() {
        let error = ErrorDescriptor::serialization("cannot encode").with_details("map");
        assert_eq!(error.to_string(), "cannot encode (map)");
    }
}
