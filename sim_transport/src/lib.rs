//! # Simulated Transport
//!
//! In-memory execution contexts for exercising endpoints without a browser.
//!
//! ## Purpose
//!
//! - Runs under `cargo test`
//! - Deterministic (no randomness, delivery order is post order)
//! - Inspectable (delivery and drop counts are exposed)
//! - Hostile on demand (drops, duplicates, foreign traffic)
//!
//! ## Philosophy
//!
//! **Browser semantics, not a mock.** A [`MemoryTarget`] stamps the sender's
//! origin on every message and refuses delivery when the target origin
//! filter does not match the receiving context, exactly as the real channel
//! does. Tests then layer [`FaultPlan`]s on top.

pub mod context;
pub mod fault_injection;

pub use context::{linked_contexts, LinkedContexts, MemoryContext, MemoryTarget};
pub use fault_injection::{FaultInjector, FaultPlan, MessageFault};
