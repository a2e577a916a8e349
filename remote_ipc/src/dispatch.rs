//! Inbound message handling
//!
//! Every raw message passes three gates in order: it must decode to an
//! envelope, come from an accepted origin and carry this endpoint's channel
//! key. Anything failing a gate is dropped silently; the sender hears
//! nothing back.

use crate::endpoint::EndpointInner;
use crate::Endpoint;
use codec::Value;
use core_types::CorrelationId;
use ipc::{Envelope, ErrorDescriptor, EventKey, InboundMessage};
use std::rc::Rc;
use tracing::{debug, trace, warn};

impl Endpoint {
    /// Processes one raw inbound message
    ///
    /// Messages subscribed through the host arrive here on their own; this
    /// is public for hosts that deliver messages by hand.
    pub fn handle_posted_message(&self, message: InboundMessage) {
        if self.is_closed() {
            return;
        }

        let envelope = match Envelope::decode(&message.data, self.inner.codec.as_ref()) {
            Ok(envelope) => envelope,
            Err(err) => {
                trace!(error = %err, "dropping undecodable message");
                return;
            }
        };

        if !self.inner.origin.matches(&message.origin) {
            trace!(origin = %message.origin, "dropping message from unexpected origin");
            return;
        }

        if envelope.channel() != &self.inner.channel {
            trace!(channel = %envelope.channel(), "dropping message for another channel");
            return;
        }

        match envelope {
            Envelope::Broadcast { data, .. } => self.dispatch_broadcast(&data),
            Envelope::Call { name, id, args, .. } => self.dispatch_call(name, id, args),
            Envelope::Result { id, outcome, .. } => self.dispatch_result(&id, outcome),
            Envelope::Unknown { kind, .. } => {
                trace!(kind = %kind, "ignoring envelope of unknown kind");
            }
        }
    }

    fn dispatch_broadcast(&self, data: &Value) {
        // Snapshot so listeners may register or remove listeners
        let listeners = self.inner.listeners.borrow().broadcast_listeners();
        for listener in listeners {
            if let Err(err) = listener(data) {
                warn!(error = %err, "broadcast listener failed");
            }
        }
    }

    fn dispatch_call(&self, name: String, id: CorrelationId, args: Vec<Value>) {
        let listener = self.inner.listeners.borrow().function_listener(&name);
        let Some(listener) = listener else {
            debug!(function = %name, id = %id, "no listener for remote call");
            let key = EventKey::function(name);
            reply(&self.inner, id, Err(ErrorDescriptor::no_listener(&key)));
            return;
        };

        debug!(function = %name, id = %id, "handling remote call");
        let weak = Rc::downgrade(&self.inner);
        tokio::task::spawn_local(async move {
            let outcome = listener(args).await.map_err(|err| {
                warn!(function = %name, id = %id, error = %err, "function listener failed");
                ErrorDescriptor::listener_failed(err.message())
            });
            match weak.upgrade() {
                Some(inner) if !inner.closed.get() => reply(&inner, id, outcome),
                _ => trace!(function = %name, "endpoint closed before call finished"),
            }
        });
    }

    fn dispatch_result(&self, id: &CorrelationId, outcome: Result<Value, ErrorDescriptor>) {
        if !self.inner.pending.borrow_mut().resolve(id, outcome) {
            trace!(id = %id, "dropping result for unknown or settled call");
        }
    }
}

/// Posts a `functionResult` for call `id`
///
/// A result the codec cannot encode is replaced by a serialization error so
/// the caller still settles.
fn reply(inner: &EndpointInner, id: CorrelationId, outcome: Result<Value, ErrorDescriptor>) {
    let envelope = Envelope::result(inner.channel.clone(), id.clone(), outcome);
    let raw = match inner.encode(&envelope) {
        Ok(raw) => raw,
        Err(err) => {
            warn!(id = %id, error = %err, "call result is not serializable");
            let error = ErrorDescriptor::serialization("call result is not serializable")
                .with_details(err.to_string());
            let fallback = Envelope::result(inner.channel.clone(), id.clone(), Err(error));
            match inner.encode(&fallback) {
                Ok(raw) => raw,
                Err(err) => {
                    warn!(id = %id, error = %err, "failed to encode error result");
                    return;
                }
            }
        }
    };

    if let Err(err) = inner.post(raw) {
        warn!(id = %id, error = %err, "failed to post call result");
    }
}
