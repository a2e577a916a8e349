//! Envelope contract tests
//!
//! These tests define the stable field layout of every envelope kind.

// ===== Envelope Types =====
pub const TYPE_BROADCAST: &str = "broadcast";
pub const TYPE_FUNCTION_RESULT: &str = "functionResult";
pub const TYPE_FUNCTION_PREFIX: &str = "function:";

// ===== Channel Keys =====
pub const DEFAULT_CHANNEL_KEY: &str = "__channel";
pub const C1_CHANNEL_KEY: &str = "__channel_c1";

// ===== Contract Tests =====
