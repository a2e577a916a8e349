//! Configuration contract tests
//!
//! Option names are shared with peers configured from JSON.

// ===== Option Names =====
pub const OPTION_ORIGIN: &str = "origin";
pub const OPTION_CHANNEL: &str = "channel";
pub const OPTION_FUNCTION_TIMEOUT: &str = "functionTimeoutMs";
pub const OPTION_SUPPORT_EVALUATE: &str = "supportEvaluate";
pub const OPTION_MAX_PENDING_CALLS: &str = "maxPendingCalls";

// ===== Contract Tests =====
