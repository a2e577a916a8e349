//! Listener registry
//!
//! Maps event keys to listeners. Broadcast listeners form an ordered list
//! that may hold any number of entries; each function name holds at most one
//! listener.

use crate::{EndpointError, ListenerResult};
use codec::Value;
use futures::future::{self, FutureExt, LocalBoxFuture};
use ipc::EventKey;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::rc::Rc;

/// Broadcast listener callable
pub type BroadcastFn = Rc<dyn Fn(&Value) -> ListenerResult<()>>;

/// Function listener callable
pub type FunctionFn = Rc<dyn Fn(Vec<Value>) -> LocalBoxFuture<'static, ListenerResult<Value>>>;

/// Handle returned by registration, used to remove the listener again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Listener(#{})", self.0)
    }
}

/// A listener of either kind
#[derive(Clone)]
pub enum Listener {
    Broadcast(BroadcastFn),
    Function(FunctionFn),
}

impl Listener {
    pub fn broadcast<F>(listener: F) -> Self
    where
        F: Fn(&Value) -> ListenerResult<()> + 'static,
    {
        Listener::Broadcast(Rc::new(listener))
    }

    /// Wraps an async function listener
    pub fn function<F, Fut>(listener: F) -> Self
    where
        F: Fn(Vec<Value>) -> Fut + 'static,
        Fut: Future<Output = ListenerResult<Value>> + 'static,
    {
        Listener::Function(Rc::new(move |args| listener(args).boxed_local()))
    }

    /// Wraps a function listener that completes immediately
    pub fn function_sync<F>(listener: F) -> Self
    where
        F: Fn(Vec<Value>) -> ListenerResult<Value> + 'static,
    {
        Listener::function(move |args| future::ready(listener(args)))
    }

    fn kind(&self) -> &'static str {
        match self {
            Listener::Broadcast(_) => "broadcast",
            Listener::Function(_) => "function",
        }
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Listener").field(&self.kind()).finish()
    }
}

#[derive(Default)]
pub struct ListenerRegistry {
    next_id: u64,
    broadcast: Vec<(ListenerId, BroadcastFn)>,
    functions: HashMap<String, (ListenerId, FunctionFn)>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener under `key`
    ///
    /// The listener kind must match the key kind. A function name that
    /// already has a listener is rejected and the existing one is kept.
    pub fn on(&mut self, key: EventKey, listener: Listener) -> Result<ListenerId, EndpointError> {
        match (key, listener) {
            (EventKey::Broadcast, Listener::Broadcast(callback)) => {
                let id = self.allocate_id();
                self.broadcast.push((id, callback));
                Ok(id)
            }
            (EventKey::RemoteCall(name), Listener::Function(callback)) => {
                if self.functions.contains_key(&name) {
                    return Err(EndpointError::DuplicateListener(EventKey::RemoteCall(
                        name,
                    )));
                }
                let id = self.allocate_id();
                self.functions.insert(name, (id, callback));
                Ok(id)
            }
            (key, _) => Err(EndpointError::ListenerKindMismatch(key)),
        }
    }

    /// Removes the listener registered as `id` under `key`
    ///
    /// Returns `false` if no such listener is registered.
    pub fn off(&mut self, key: &EventKey, id: ListenerId) -> bool {
        match key {
            EventKey::Broadcast => {
                let before = self.broadcast.len();
                self.broadcast.retain(|(existing, _)| *existing != id);
                self.broadcast.len() != before
            }
            EventKey::RemoteCall(name) => match self.functions.get(name) {
                Some((existing, _)) if *existing == id => {
                    self.functions.remove(name);
                    true
                }
                _ => false,
            },
        }
    }

    /// Snapshot of broadcast listeners in registration order
    pub fn broadcast_listeners(&self) -> Vec<BroadcastFn> {
        self.broadcast
            .iter()
            .map(|(_, callback)| Rc::clone(callback))
            .collect()
    }

    pub fn function_listener(&self, name: &str) -> Option<FunctionFn> {
        self.functions
            .get(name)
            .map(|(_, callback)| Rc::clone(callback))
    }

    pub fn broadcast_count(&self) -> usize {
        self.broadcast.len()
    }

    pub fn function_count(&self) -> usize {
        self.functions.len()
    }

    fn allocate_id(&mut self) -> ListenerId {
        self.next_id += 1;
        ListenerId(self.next_id)
    }
}
