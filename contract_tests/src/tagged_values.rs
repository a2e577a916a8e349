//! Tagged value contract tests
//!
//! Values without a plain JSON form travel as `{"$type": <tag>, ...}`
//! objects. Tag names and their fields are part of the wire contract.

// ===== Tag Field =====
pub const TAG_FIELD: &str = "$type";

// ===== Contract Tests =====
