//! Endpoint configuration
//!
//! Configuration is fixed once an endpoint is built. It can be assembled in
//! code with the `with_*` methods or parsed from JSON using the camelCase
//! option names peers already use (`origin`, `channel`, `functionTimeoutMs`,
//! `supportEvaluate`, `maxPendingCalls`). Missing options take defaults;
//! unrecognised options are ignored.

use crate::EndpointError;
use core_types::Origin;
use ipc::ChannelKey;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default remote call timeout
pub const DEFAULT_FUNCTION_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EndpointConfig {
    /// Origin filter for inbound messages and target origin for outbound
    pub origin: Origin,
    /// Channel identifier; unset selects the default channel
    pub channel: Option<String>,
    /// Per-call timeout in milliseconds
    pub function_timeout_ms: u64,
    /// Whether peers may run code through `evaluate`
    pub support_evaluate: bool,
    /// Upper bound on in-flight calls; unset means unbounded
    pub max_pending_calls: Option<usize>,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            origin: Origin::Any,
            channel: None,
            function_timeout_ms: DEFAULT_FUNCTION_TIMEOUT_MS,
            support_evaluate: false,
            max_pending_calls: None,
        }
    }
}

impl EndpointConfig {
    /// Creates a configuration with all defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a JSON configuration object
    pub fn from_json(json: &str) -> Result<Self, EndpointError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_origin(mut self, origin: impl Into<Origin>) -> Self {
        self.origin = origin.into();
        self
    }

    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = Some(channel.into());
        self
    }

    pub fn with_function_timeout(mut self, timeout: Duration) -> Self {
        self.function_timeout_ms = timeout.as_millis().try_into().unwrap_or(u64::MAX);
        self
    }

    pub fn with_evaluate(mut self, enabled: bool) -> Self {
        self.support_evaluate = enabled;
        self
    }

    pub fn with_max_pending_calls(mut self, limit: usize) -> Self {
        self.max_pending_calls = Some(limit);
        self
    }

    /// Checks the invariants construction relies on
    pub fn validate(&self) -> Result<(), EndpointError> {
        if self.function_timeout_ms == 0 {
            return Err(EndpointError::InvalidConfig(
                "functionTimeoutMs must be positive".to_string(),
            ));
        }
        if self.max_pending_calls == Some(0) {
            return Err(EndpointError::InvalidConfig(
                "maxPendingCalls must be positive when set".to_string(),
            ));
        }
        Ok(())
    }

    pub fn function_timeout(&self) -> Duration {
        Duration::from_millis(self.function_timeout_ms)
    }

    /// Channel key derived from the channel identifier
    pub fn channel_key(&self) -> ChannelKey {
        ChannelKey::derive(self.channel.as_deref())
    }
}
