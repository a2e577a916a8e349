//! Unique identifiers for calls and subscriptions

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifier linking a remote call to its eventual result
///
/// Locally issued calls always carry a random UUID rendered as text, so
/// concurrent calls from one endpoint never collide. Peers using other
/// schemes may send plain integers; those are echoed back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CorrelationId {
    /// Textual identifier (the form this crate generates)
    Text(String),
    /// Integral identifier sent by a foreign peer
    Number(i64),
}

impl CorrelationId {
    /// Creates a new random correlation ID
    pub fn new() -> Self {
        Self::Text(Uuid::new_v4().to_string())
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CorrelationId::Text(text) => write!(f, "Call({})", text),
            CorrelationId::Number(n) => write!(f, "Call(#{})", n),
        }
    }
}

impl From<i64> for CorrelationId {
    fn from(n: i64) -> Self {
        Self::Number(n)
    }
}

impl From<&str> for CorrelationId {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

/// Unique identifier for an inbound subscription on a host context
///
/// Each endpoint owns exactly one subscription; the ID lets the host
/// replace it idempotently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    /// Creates a new random subscription ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SubscriptionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Subscription({})", self.0)
    }
}
