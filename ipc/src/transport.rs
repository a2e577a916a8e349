//! Transport adapter contract
//!
//! The raw channel is split in two, the way a browser splits it: a
//! [`MessageTarget`] is a handle to the remote context that messages are
//! posted to, and a [`MessageHost`] is the local context whose inbound
//! stream endpoints subscribe to.

use crate::TransportError;
use core_types::SubscriptionId;
use tokio::sync::mpsc;

/// One raw inbound message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Raw text payload
    pub data: String,
    /// Origin of the sending context
    pub origin: String,
}

impl InboundMessage {
    pub fn new(data: impl Into<String>, origin: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            origin: origin.into(),
        }
    }
}

/// Sending half handed to a host on subscription
pub type InboundSink = mpsc::UnboundedSender<InboundMessage>;

/// Non-owning view of a sink; upgrades only while a host still holds it
pub type WeakInboundSink = mpsc::WeakUnboundedSender<InboundMessage>;

/// Receiving half kept by the subscriber
pub type InboundStream = mpsc::UnboundedReceiver<InboundMessage>;

/// Creates a connected sink/stream pair
///
/// Delivery through the queue never re-enters the subscriber
/// synchronously; messages are processed on the subscriber's own task.
pub fn inbound_channel() -> (InboundSink, InboundStream) {
    mpsc::unbounded_channel()
}

/// Handle to a remote context
pub trait MessageTarget {
    /// Posts raw text to the remote context
    ///
    /// `target_origin` is either an exact origin or `*`. A context whose
    /// origin does not match must not receive the message. Posting never
    /// blocks and gives no delivery acknowledgment.
    fn post_message(&self, data: String, target_origin: &str) -> Result<(), TransportError>;
}

/// The local context's inbound message stream
pub trait MessageHost {
    /// Registers `sink` under `id`, replacing any sink already registered
    /// under the same id
    ///
    /// A replaced or unsubscribed sink must be dropped, not retained; its
    /// subscriber detects the loss through the end of its stream.
    fn subscribe(&self, id: SubscriptionId, sink: InboundSink);

    /// Removes the sink registered under `id`; returns whether one existed
    fn unsubscribe(&self, id: SubscriptionId) -> bool;
}
