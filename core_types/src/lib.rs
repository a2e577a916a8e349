//! # Core Types
//!
//! This crate defines the fundamental types shared by every postbridge crate.
//!
//! ## Philosophy
//!
//! - **Explicit over implicit**: Identifiers are typed and cannot be confused.
//! - **Type safety first**: An origin filter is a value, not a magic string.
//!
//! ## Key Types
//!
//! - [`CorrelationId`]: Links a remote call to its result
//! - [`SubscriptionId`]: Identifies an endpoint's inbound subscription
//! - [`Origin`]: Origin filter used for addressing

pub mod ids;
pub mod origin;

pub use ids::{CorrelationId, SubscriptionId};
pub use origin::{Origin, WILDCARD_ORIGIN};
