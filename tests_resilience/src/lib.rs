//! Resilience Test Utilities
//!
//! This crate provides shared utilities for resilience and integration tests.
//!
//! ## Test Philosophy
//!
//! - **Every call settles**: Lost, late or duplicated results never leave a
//!   caller hanging or settle it twice
//! - **Deterministic failures**: All faults are reproducible via FaultPlan
//! - **Deterministic time**: Tests run on a paused clock
//! - **Hostile neighbours**: Foreign traffic never reaches listeners

use codec::{TaggedJsonCodec, Value};
use core_types::CorrelationId;
use ipc::{ChannelKey, Envelope};
use remote_ipc::{Endpoint, EndpointConfig, ListenerId};
use sim_transport::{linked_contexts, FaultPlan, LinkedContexts};
use std::cell::Cell;
use std::future::Future;
use std::rc::Rc;
use std::time::Duration;

pub const PARENT_ORIGIN: &str = "https://parent.example";
pub const CHILD_ORIGIN: &str = "https://child.example";

/// Two endpoints wired to each other through memory contexts
pub struct TestBridge {
    pub contexts: LinkedContexts,
    pub parent: Endpoint,
    pub child: Endpoint,
}

/// Bootstrap helper for tests
///
/// Must run inside a `LocalSet`; see [`run_local`].
pub fn test_bootstrap(parent: EndpointConfig, child: EndpointConfig) -> TestBridge {
    test_bootstrap_with_faults(parent, child, FaultPlan::new(), FaultPlan::new())
}

/// Bootstrap helper applying fault plans to what each side receives
pub fn test_bootstrap_with_faults(
    parent: EndpointConfig,
    child: EndpointConfig,
    parent_faults: FaultPlan,
    child_faults: FaultPlan,
) -> TestBridge {
    let contexts = linked_contexts(PARENT_ORIGIN, CHILD_ORIGIN);
    contexts.a.set_fault_plan(parent_faults);
    contexts.b.set_fault_plan(child_faults);

    let parent = Endpoint::builder(contexts.a.clone())
        .with_target(contexts.a_to_b.clone())
        .with_config(parent)
        .build()
        .expect("Failed to build parent endpoint");
    let child = Endpoint::builder(contexts.b.clone())
        .with_target(contexts.b_to_a.clone())
        .with_config(child)
        .build()
        .expect("Failed to build child endpoint");

    TestBridge {
        contexts,
        parent,
        child,
    }
}

/// Runs `future` inside a fresh `LocalSet`
pub async fn run_local<F: Future>(future: F) -> F::Output {
    tokio::task::LocalSet::new().run_until(future).await
}

/// Lets every ready task run
///
/// On a paused clock the short sleep only completes once nothing else can
/// make progress.
pub async fn quiesce() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

/// Registers `double(n) = 2n` and returns its invocation counter
pub fn register_double(endpoint: &Endpoint) -> (ListenerId, Rc<Cell<usize>>) {
    let calls = Rc::new(Cell::new(0));
    let counter = Rc::clone(&calls);
    let id = endpoint
        .on_function_sync("double", move |args| {
            counter.set(counter.get() + 1);
            let n: i64 = codec::from_value(args.first().cloned().unwrap_or_default())?;
            Ok(Value::from(n * 2))
        })
        .expect("Failed to register double");
    (id, calls)
}

/// Registers a function listener that never completes
pub fn register_hang(endpoint: &Endpoint, name: &str) -> ListenerId {
    endpoint
        .on_function(name, |_| futures::future::pending())
        .expect("Failed to register hanging listener")
}

/// Encodes a call envelope the way a foreign peer would
pub fn raw_call(channel: &ChannelKey, name: &str, id: CorrelationId, args: Vec<Value>) -> String {
    Envelope::call(channel.clone(), name, id, args)
        .encode(&TaggedJsonCodec)
        .expect("Failed to encode call")
}

/// Encodes a result envelope the way a foreign peer would
pub fn raw_result(channel: &ChannelKey, id: CorrelationId, result: Value) -> String {
    Envelope::result(channel.clone(), id, Ok(result))
        .encode(&TaggedJsonCodec)
        .expect("Failed to encode result")
}
