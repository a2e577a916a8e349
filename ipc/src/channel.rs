//! Channel keys scoping which endpoints interoperate

use std::fmt;

/// Prefix shared by every channel key
pub const CHANNEL_KEY_PREFIX: &str = "__channel";

/// Derived key carried in every envelope's `channel` field
///
/// Two endpoints interoperate only if their keys match exactly. The key is
/// independent of origin filtering.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChannelKey(String);

impl ChannelKey {
    /// Derives the key for a channel identifier
    ///
    /// `None` and the empty string both select the default channel.
    pub fn derive(channel_id: Option<&str>) -> Self {
        match channel_id {
            Some(id) if !id.is_empty() => Self(format!("{}_{}", CHANNEL_KEY_PREFIX, id)),
            _ => Self(CHANNEL_KEY_PREFIX.to_string()),
        }
    }

    /// Key of the default channel
    pub fn default_channel() -> Self {
        Self::derive(None)
    }

    /// Wraps a key exactly as received from the wire
    pub fn from_wire(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Returns the key as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ChannelKey {
    fn default() -> Self {
        Self::default_channel()
    }
}

impl fmt::Display for ChannelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
