//! Deterministic fault injection for simulated delivery
//!
//! A [`FaultPlan`] is attached to a receiving [`MemoryContext`]; every
//! message posted into that context through a [`MemoryTarget`] passes the
//! context's [`FaultInjector`] first.
//!
//! ## Design Philosophy
//!
//! - **Deterministic**: No randomness; faults fire in plan order
//! - **Composable**: Multiple faults can be combined in one plan
//! - **Test-focused**: Not intended for production use
//!
//! ## Example
//!
//! ```
//! use sim_transport::fault_injection::{FaultPlan, MessageFault};
//!
//! let plan = FaultPlan::new()
//!     .with_message_fault(MessageFault::DropMatching {
//!         needle: "functionResult".to_string(),
//!     })
//!     .with_message_fault(MessageFault::Duplicate { count: 1 });
//! assert_eq!(plan.message_faults().len(), 2);
//! ```
//!
//! [`MemoryContext`]: crate::MemoryContext
//! [`MemoryTarget`]: crate::MemoryTarget

/// A fault to inject into message delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageFault {
    /// Drop the next N messages
    DropNext { count: usize },

    /// Drop every message whose text contains `needle`
    DropMatching { needle: String },

    /// Deliver the next N messages twice
    Duplicate { count: usize },
}

/// A plan describing all faults to inject
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FaultPlan {
    message_faults: Vec<MessageFault>,
}

impl FaultPlan {
    /// Creates a new empty fault plan
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a message fault to the plan
    pub fn with_message_fault(mut self, fault: MessageFault) -> Self {
        self.message_faults.push(fault);
        self
    }

    pub fn message_faults(&self) -> &[MessageFault] {
        &self.message_faults
    }

    pub fn is_empty(&self) -> bool {
        self.message_faults.is_empty()
    }
}

/// Fault injector tracking how much of each fault is left
#[derive(Debug, Default)]
pub struct FaultInjector {
    drop_next_count: usize,
    duplicate_count: usize,
    drop_needles: Vec<String>,
    messages_seen: usize,
}

impl FaultInjector {
    pub fn new(plan: FaultPlan) -> Self {
        let mut injector = Self::default();
        for fault in plan.message_faults {
            match fault {
                MessageFault::DropNext { count } => injector.drop_next_count += count,
                MessageFault::DropMatching { needle } => injector.drop_needles.push(needle),
                MessageFault::Duplicate { count } => injector.duplicate_count += count,
            }
        }
        injector
    }

    /// Decides how many copies of `data` to deliver
    ///
    /// Returns 0 when the message is dropped, 2 when it is duplicated.
    pub fn copies(&mut self, data: &str) -> usize {
        self.messages_seen += 1;

        if self.drop_next_count > 0 {
            self.drop_next_count -= 1;
            return 0;
        }

        if self.drop_needles.iter().any(|needle| data.contains(needle)) {
            return 0;
        }

        if self.duplicate_count > 0 {
            self.duplicate_count -= 1;
            return 2;
        }

        1
    }

    /// Number of messages that passed through the injector
    pub fn messages_seen(&self) -> usize {
        self.messages_seen
    }
}
