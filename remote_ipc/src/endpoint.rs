//! Endpoint construction and outbound operations

use crate::evaluate::{self, Evaluator, EVALUATE_FUNCTION};
use crate::{
    CallError, EndpointConfig, EndpointError, Listener, ListenerId, ListenerRegistry,
    ListenerResult, PendingCalls,
};
use codec::{Codec, TaggedJsonCodec, Value};
use core_types::{CorrelationId, Origin, SubscriptionId};
use ipc::{
    inbound_channel, ChannelKey, Envelope, EnvelopeError, EventKey, InboundStream, MessageHost,
    MessageTarget, TransportError, WeakInboundSink,
};
use serde::de::DeserializeOwned;
use std::cell::{Cell, RefCell};
use std::future::Future;
use std::rc::{Rc, Weak};
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

/// Builder for [`Endpoint`]
///
/// The host (local context) is required up front; the target (remote
/// context) must be supplied before [`build`](Self::build).
pub struct EndpointBuilder {
    host: Rc<dyn MessageHost>,
    target: Option<Rc<dyn MessageTarget>>,
    codec: Rc<dyn Codec>,
    evaluator: Option<Rc<dyn Evaluator>>,
    config: EndpointConfig,
    subscription: SubscriptionId,
}

impl EndpointBuilder {
    pub fn new(host: Rc<dyn MessageHost>) -> Self {
        Self {
            host,
            target: None,
            codec: Rc::new(TaggedJsonCodec),
            evaluator: None,
            config: EndpointConfig::default(),
            subscription: SubscriptionId::new(),
        }
    }

    pub fn with_target(mut self, target: Rc<dyn MessageTarget>) -> Self {
        self.target = Some(target);
        self
    }

    pub fn with_config(mut self, config: EndpointConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the default tagged JSON codec
    pub fn with_codec(mut self, codec: Rc<dyn Codec>) -> Self {
        self.codec = codec;
        self
    }

    pub fn with_evaluator(mut self, evaluator: Rc<dyn Evaluator>) -> Self {
        self.evaluator = Some(evaluator);
        self
    }

    /// Reuses a known subscription id
    ///
    /// Building twice with the same id replaces the earlier subscription
    /// instead of adding a second one.
    pub fn with_subscription_id(mut self, id: SubscriptionId) -> Self {
        self.subscription = id;
        self
    }

    /// Validates the configuration, subscribes to the host and starts
    /// processing inbound messages
    ///
    /// # Panics
    ///
    /// Panics if called outside a [`tokio::task::LocalSet`].
    pub fn build(self) -> Result<Endpoint, EndpointError> {
        let target = self.target.ok_or(EndpointError::MissingTarget)?;
        self.config.validate()?;

        let evaluator = match (self.config.support_evaluate, self.evaluator) {
            (true, None) => return Err(EndpointError::MissingEvaluator),
            (true, Some(evaluator)) => Some(evaluator),
            (false, _) => None,
        };

        let inner = Rc::new(EndpointInner {
            subscription: self.subscription,
            origin: self.config.origin.clone(),
            channel: self.config.channel_key(),
            listeners: RefCell::new(ListenerRegistry::new()),
            pending: RefCell::new(PendingCalls::new(self.config.max_pending_calls)),
            config: self.config,
            target,
            host: self.host,
            codec: self.codec,
            sink: RefCell::new(None),
            pump: RefCell::new(None),
            closed: Cell::new(false),
        });
        let endpoint = Endpoint { inner };

        if let Some(evaluator) = evaluator {
            endpoint.on_function_sync(EVALUATE_FUNCTION, move |args| {
                evaluator.evaluate(evaluate::source_argument(&args)?)
            })?;
        }

        endpoint.bind();
        debug!(
            channel = %endpoint.inner.channel,
            origin = %endpoint.inner.origin,
            subscription = %endpoint.inner.subscription,
            "endpoint ready"
        );
        Ok(endpoint)
    }
}

pub(crate) struct EndpointInner {
    pub(crate) subscription: SubscriptionId,
    pub(crate) config: EndpointConfig,
    pub(crate) origin: Origin,
    pub(crate) channel: ChannelKey,
    pub(crate) target: Rc<dyn MessageTarget>,
    pub(crate) host: Rc<dyn MessageHost>,
    pub(crate) codec: Rc<dyn Codec>,
    pub(crate) listeners: RefCell<ListenerRegistry>,
    pub(crate) pending: RefCell<PendingCalls>,
    sink: RefCell<Option<WeakInboundSink>>,
    pump: RefCell<Option<JoinHandle<()>>>,
    pub(crate) closed: Cell<bool>,
}

impl EndpointInner {
    fn shutdown(&self) {
        if self.closed.replace(true) {
            return;
        }
        // The id may already belong to a newer endpoint's sink
        let owns_subscription = self
            .sink
            .borrow_mut()
            .take()
            .and_then(|sink| sink.upgrade())
            .is_some();
        if owns_subscription {
            self.host.unsubscribe(self.subscription);
        }
        if let Some(pump) = self.pump.borrow_mut().take() {
            pump.abort();
        }
        let rejected = self.pending.borrow_mut().close_all();
        debug!(
            subscription = %self.subscription,
            rejected,
            "endpoint closed"
        );
    }

    pub(crate) fn encode(&self, envelope: &Envelope) -> Result<String, EnvelopeError> {
        envelope.encode(self.codec.as_ref())
    }

    pub(crate) fn post(&self, raw: String) -> Result<(), TransportError> {
        self.target.post_message(raw, self.origin.as_str())
    }
}

impl Drop for EndpointInner {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// One side of a broadcast and RPC bridge
///
/// Cloning yields another handle to the same endpoint. The endpoint stays
/// subscribed until [`close`](Self::close) is called, the last handle is
/// dropped, or another endpoint is built with the same subscription id.
///
/// A listener that captures an `Endpoint` keeps it alive through its own
/// registry; capture a [`WeakEndpoint`] from [`downgrade`](Self::downgrade)
/// instead, or call [`close`](Self::close) explicitly.
#[derive(Clone)]
pub struct Endpoint {
    pub(crate) inner: Rc<EndpointInner>,
}

/// Handle that does not keep its [`Endpoint`] alive
#[derive(Clone)]
pub struct WeakEndpoint {
    inner: Weak<EndpointInner>,
}

impl WeakEndpoint {
    /// Returns the endpoint if any strong handle still exists
    pub fn upgrade(&self) -> Option<Endpoint> {
        self.inner.upgrade().map(|inner| Endpoint { inner })
    }
}

impl Endpoint {
    pub fn builder(host: Rc<dyn MessageHost>) -> EndpointBuilder {
        EndpointBuilder::new(host)
    }

    pub fn downgrade(&self) -> WeakEndpoint {
        WeakEndpoint {
            inner: Rc::downgrade(&self.inner),
        }
    }

    pub fn origin(&self) -> &Origin {
        &self.inner.origin
    }

    pub fn channel(&self) -> &ChannelKey {
        &self.inner.channel
    }

    pub fn config(&self) -> &EndpointConfig {
        &self.inner.config
    }

    pub fn subscription_id(&self) -> SubscriptionId {
        self.inner.subscription
    }

    /// Number of calls still awaiting a result
    pub fn pending_calls(&self) -> usize {
        self.inner.pending.borrow().len()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.get()
    }

    /// Registers a listener under `key`
    pub fn on(&self, key: EventKey, listener: Listener) -> Result<ListenerId, EndpointError> {
        if self.is_closed() {
            return Err(EndpointError::Closed);
        }
        let mut listeners = self.inner.listeners.borrow_mut();
        let id = listeners.on(key.clone(), listener)?;
        debug!(
            key = %key,
            listener = %id,
            broadcast_listeners = listeners.broadcast_count(),
            function_listeners = listeners.function_count(),
            "listener registered"
        );
        Ok(id)
    }

    pub fn on_broadcast<F>(&self, listener: F) -> Result<ListenerId, EndpointError>
    where
        F: Fn(&Value) -> ListenerResult<()> + 'static,
    {
        self.on(EventKey::Broadcast, Listener::broadcast(listener))
    }

    /// Registers an async function listener callable by the peer
    pub fn on_function<F, Fut>(
        &self,
        name: impl Into<String>,
        listener: F,
    ) -> Result<ListenerId, EndpointError>
    where
        F: Fn(Vec<Value>) -> Fut + 'static,
        Fut: Future<Output = ListenerResult<Value>> + 'static,
    {
        self.on(EventKey::function(name), Listener::function(listener))
    }

    pub fn on_function_sync<F>(
        &self,
        name: impl Into<String>,
        listener: F,
    ) -> Result<ListenerId, EndpointError>
    where
        F: Fn(Vec<Value>) -> ListenerResult<Value> + 'static,
    {
        self.on(EventKey::function(name), Listener::function_sync(listener))
    }

    /// Removes a listener; returns `false` if it was not registered
    pub fn off(&self, key: &EventKey, id: ListenerId) -> bool {
        let removed = self.inner.listeners.borrow_mut().off(key, id);
        if removed {
            debug!(key = %key, listener = %id, "listener removed");
        }
        removed
    }

    /// Sends `data` to every broadcast listener on the peer
    ///
    /// Fire-and-forget: no acknowledgment is awaited.
    pub fn broadcast(&self, data: impl Into<Value>) -> Result<(), EndpointError> {
        if self.is_closed() {
            return Err(EndpointError::Closed);
        }
        let envelope = Envelope::broadcast(self.inner.channel.clone(), data.into());
        let raw = self.inner.encode(&envelope)?;
        self.inner.post(raw)?;
        trace!(channel = %self.inner.channel, "broadcast posted");
        Ok(())
    }

    /// Invokes the peer's function listener `name` and waits for its result
    ///
    /// Settles with the listener's value, the peer's error descriptor, or a
    /// timeout after the configured function timeout.
    ///
    /// # Panics
    ///
    /// Panics if awaited outside a [`tokio::task::LocalSet`].
    pub async fn call(&self, name: &str, args: Vec<Value>) -> Result<Value, CallError> {
        if self.is_closed() {
            return Err(CallError::Closed {
                function: name.to_string(),
            });
        }

        let id = CorrelationId::new();
        let envelope = Envelope::call(self.inner.channel.clone(), name, id.clone(), args);
        let raw = self.inner.encode(&envelope)?;

        let receiver = self.inner.pending.borrow_mut().insert(id.clone(), name)?;
        let timer = self.spawn_timer(id.clone());
        self.inner.pending.borrow_mut().arm_timer(&id, timer);

        if let Err(err) = self.inner.post(raw) {
            self.inner.pending.borrow_mut().discard(&id);
            warn!(function = name, id = %id, error = %err, "failed to post remote call");
            return Err(err.into());
        }
        debug!(function = name, id = %id, "remote call issued");

        match receiver.await {
            Ok(outcome) => outcome,
            Err(_) => Err(CallError::Closed {
                function: name.to_string(),
            }),
        }
    }

    /// Like [`call`](Self::call), deserializing the result into `T`
    pub async fn call_as<T: DeserializeOwned>(
        &self,
        name: &str,
        args: Vec<Value>,
    ) -> Result<T, CallError> {
        let value = self.call(name, args).await?;
        codec::from_value(value).map_err(CallError::ResultType)
    }

    /// Runs `body` applied to `args` in the peer's evaluator
    ///
    /// The peer must have been built with evaluation enabled; otherwise the
    /// call fails with a remote `no_listener` error.
    pub async fn evaluate(&self, body: &str, args: &[Value]) -> Result<Value, CallError> {
        let source = evaluate::invocation_source(body, args).map_err(EnvelopeError::from)?;
        self.call(EVALUATE_FUNCTION, vec![Value::String(source)]).await
    }

    /// Unsubscribes from the host and rejects every pending call
    ///
    /// Idempotent. Results that arrive afterwards are ignored.
    pub fn close(&self) {
        self.inner.shutdown();
    }

    fn bind(&self) {
        let (sink, stream) = inbound_channel();
        let host = &self.inner.host;
        host.unsubscribe(self.inner.subscription);
        *self.inner.sink.borrow_mut() = Some(sink.downgrade());
        host.subscribe(self.inner.subscription, sink);
        let pump = spawn_pump(self.downgrade(), stream);
        *self.inner.pump.borrow_mut() = Some(pump);
    }

    fn spawn_timer(&self, id: CorrelationId) -> JoinHandle<()> {
        let timeout = self.inner.config.function_timeout();
        let weak = Rc::downgrade(&self.inner);
        tokio::task::spawn_local(async move {
            tokio::time::sleep(timeout).await;
            let Some(inner) = weak.upgrade() else {
                return;
            };
            let expired = inner.pending.borrow_mut().expire(&id);
            if let Some(err) = expired {
                warn!(id = %id, error = %err, "remote call timed out");
            }
        })
    }
}

fn spawn_pump(weak: WeakEndpoint, mut stream: InboundStream) -> JoinHandle<()> {
    tokio::task::spawn_local(async move {
        while let Some(message) = stream.recv().await {
            let Some(endpoint) = weak.upgrade() else {
                return;
            };
            endpoint.handle_posted_message(message);
        }

        // The host dropped the sink: the subscription was replaced or removed
        if let Some(endpoint) = weak.upgrade() {
            if !endpoint.is_closed() {
                debug!(
                    subscription = %endpoint.inner.subscription,
                    "subscription lost, closing endpoint"
                );
                endpoint.close();
            }
        }
    })
}
