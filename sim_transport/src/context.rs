//! Simulated execution contexts and the targets that post into them

use crate::fault_injection::{FaultInjector, FaultPlan};
use core_types::{Origin, SubscriptionId};
use ipc::{InboundMessage, InboundSink, MessageHost, MessageTarget, TransportError};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tracing::trace;

/// A simulated context with its own origin and inbound message stream
///
/// Delivery fans each message out to every current subscriber in
/// subscription order.
pub struct MemoryContext {
    origin: String,
    subscribers: RefCell<Vec<(SubscriptionId, InboundSink)>>,
    faults: RefCell<FaultInjector>,
    delivered: Cell<usize>,
    dropped: Cell<usize>,
}

impl MemoryContext {
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            subscribers: RefCell::new(Vec::new()),
            faults: RefCell::new(FaultInjector::default()),
            delivered: Cell::new(0),
            dropped: Cell::new(0),
        }
    }

    /// Applies `plan` to messages posted into this context
    pub fn with_fault_plan(self, plan: FaultPlan) -> Self {
        self.set_fault_plan(plan);
        self
    }

    /// Replaces the fault plan; remaining counts of the old plan are lost
    pub fn set_fault_plan(&self, plan: FaultPlan) {
        *self.faults.borrow_mut() = FaultInjector::new(plan);
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Delivers a message as if posted from `origin`, bypassing faults
    pub fn inject(&self, data: impl Into<String>, origin: impl Into<String>) {
        self.deliver(InboundMessage::new(data, origin));
    }

    /// Messages handed to subscribers so far
    pub fn delivered(&self) -> usize {
        self.delivered.get()
    }

    /// Messages discarded by the origin filter or a fault
    pub fn dropped(&self) -> usize {
        self.dropped.get()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.borrow().len()
    }

    fn accept(&self, data: String, sender_origin: &str, target_origin: &str) {
        if !Origin::parse(target_origin).matches(&self.origin) {
            trace!(
                context = %self.origin,
                target_origin,
                "target origin does not match context"
            );
            self.dropped.set(self.dropped.get() + 1);
            return;
        }

        let copies = self.faults.borrow_mut().copies(&data);
        if copies == 0 {
            trace!(context = %self.origin, "message dropped by fault plan");
            self.dropped.set(self.dropped.get() + 1);
            return;
        }

        for _ in 0..copies {
            self.deliver(InboundMessage::new(data.clone(), sender_origin));
        }
    }

    fn deliver(&self, message: InboundMessage) {
        self.delivered.set(self.delivered.get() + 1);
        for (_, sink) in self.subscribers.borrow().iter() {
            // A subscriber whose stream is gone has stopped listening.
            let _ = sink.send(message.clone());
        }
    }
}

impl MessageHost for MemoryContext {
    fn subscribe(&self, id: SubscriptionId, sink: InboundSink) {
        let mut subscribers = self.subscribers.borrow_mut();
        match subscribers.iter_mut().find(|(existing, _)| *existing == id) {
            Some(entry) => entry.1 = sink,
            None => subscribers.push((id, sink)),
        }
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.borrow_mut();
        let before = subscribers.len();
        subscribers.retain(|(existing, _)| *existing != id);
        subscribers.len() != before
    }
}

/// Handle from one context to another
///
/// Posted messages carry the sending context's origin and are subject to
/// the receiving context's origin and fault plan.
pub struct MemoryTarget {
    from_origin: String,
    to: Rc<MemoryContext>,
    closed: Cell<bool>,
}

impl MemoryTarget {
    pub fn new(from: &MemoryContext, to: Rc<MemoryContext>) -> Self {
        Self {
            from_origin: from.origin.clone(),
            to,
            closed: Cell::new(false),
        }
    }

    /// Makes every later post fail, as if the remote context went away
    pub fn close(&self) {
        self.closed.set(true);
    }

    pub fn context(&self) -> &Rc<MemoryContext> {
        &self.to
    }
}

impl MessageTarget for MemoryTarget {
    fn post_message(&self, data: String, target_origin: &str) -> Result<(), TransportError> {
        if self.closed.get() {
            return Err(TransportError::Closed);
        }
        self.to.accept(data, &self.from_origin, target_origin);
        Ok(())
    }
}

/// Two contexts with a target pointing each way
pub struct LinkedContexts {
    pub a: Rc<MemoryContext>,
    pub b: Rc<MemoryContext>,
    /// Posts from `a` into `b`
    pub a_to_b: Rc<MemoryTarget>,
    /// Posts from `b` into `a`
    pub b_to_a: Rc<MemoryTarget>,
}

pub fn linked_contexts(origin_a: &str, origin_b: &str) -> LinkedContexts {
    let a = Rc::new(MemoryContext::new(origin_a));
    let b = Rc::new(MemoryContext::new(origin_b));
    let a_to_b = Rc::new(MemoryTarget::new(&a, Rc::clone(&b)));
    let b_to_a = Rc::new(MemoryTarget::new(&b, Rc::clone(&a)));
    LinkedContexts { a, b, a_to_b, b_to_a }
}
