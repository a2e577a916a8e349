//! Origin filters for addressing execution contexts

use serde::{Deserialize, Serialize};
use std::fmt;

/// Wildcard accepted as "any origin" on the wire
pub const WILDCARD_ORIGIN: &str = "*";

/// Origin filter applied to inbound and outbound messages
///
/// Outbound messages are posted with this filter as the target origin.
/// Inbound messages are accepted only if the sender's origin matches.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Origin {
    /// Matches every origin
    #[default]
    Any,
    /// Matches exactly one origin string
    Exact(String),
}

impl Origin {
    /// Parses an origin filter; `*` and the empty string mean any origin
    pub fn parse(origin: &str) -> Self {
        if origin.is_empty() || origin == WILDCARD_ORIGIN {
            Origin::Any
        } else {
            Origin::Exact(origin.to_string())
        }
    }

    /// Checks whether a sender origin passes this filter
    pub fn matches(&self, sender: &str) -> bool {
        match self {
            Origin::Any => true,
            Origin::Exact(expected) => expected == sender,
        }
    }

    /// Returns true if this filter accepts every origin
    pub fn is_wildcard(&self) -> bool {
        matches!(self, Origin::Any)
    }

    /// Returns the filter as sent on outbound messages
    pub fn as_str(&self) -> &str {
        match self {
            Origin::Any => WILDCARD_ORIGIN,
            Origin::Exact(origin) => origin,
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for Origin {
    fn from(origin: String) -> Self {
        Origin::parse(&origin)
    }
}

impl From<&str> for Origin {
    fn from(origin: &str) -> Self {
        Origin::parse(origin)
    }
}

impl From<Origin> for String {
    fn from(origin: Origin) -> Self {
        origin.as_str().to_string()
    }
}
