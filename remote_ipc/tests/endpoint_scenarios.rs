//! End-to-end scenarios between two endpoints over linked memory contexts

use codec::{JsonCodec, TaggedJsonCodec, Value};
use core_types::{CorrelationId, SubscriptionId};
use ipc::{ChannelKey, Envelope, ErrorCode, EventKey};
use remote_ipc::{
    CallError, Endpoint, EndpointConfig, EndpointError, ListenerError, ListenerResult,
};
use sim_transport::{linked_contexts, LinkedContexts};
use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;
use std::time::Duration;

const ORIGIN_A: &str = "https://a.example";
const ORIGIN_B: &str = "https://b.example";

async fn local<F: Future>(future: F) -> F::Output {
    tokio::task::LocalSet::new().run_until(future).await
}

/// Lets every ready task run
async fn quiesce() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

fn connect(
    config_a: EndpointConfig,
    config_b: EndpointConfig,
) -> (LinkedContexts, Endpoint, Endpoint) {
    let pair = linked_contexts(ORIGIN_A, ORIGIN_B);
    let a = Endpoint::builder(pair.a.clone())
        .with_target(pair.a_to_b.clone())
        .with_config(config_a)
        .build()
        .unwrap();
    let b = Endpoint::builder(pair.b.clone())
        .with_target(pair.b_to_a.clone())
        .with_config(config_b)
        .build()
        .unwrap();
    (pair, a, b)
}

fn on_channel(channel: &str) -> EndpointConfig {
    EndpointConfig::new().with_channel(channel)
}

fn register_double(endpoint: &Endpoint, calls: &Rc<RefCell<usize>>) {
    let calls = Rc::clone(calls);
    endpoint
        .on_function_sync("double", move |args| {
            *calls.borrow_mut() += 1;
            let n: i64 = codec::from_value(args.first().cloned().unwrap_or_default())?;
            Ok(Value::from(n * 2))
        })
        .unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_double_on_named_channel() {
    local(async {
        let (_pair, a, b) = connect(on_channel("c1"), on_channel("c1"));
        let calls = Rc::new(RefCell::new(0));
        register_double(&b, &calls);

        let result = a.call("double", vec![Value::from(5)]).await.unwrap();

        assert_eq!(result, Value::from(10));
        assert_eq!(*calls.borrow(), 1);
        assert_eq!(a.pending_calls(), 0);
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_call_as_deserializes_result() {
    local(async {
        let (_pair, a, b) = connect(EndpointConfig::new(), EndpointConfig::new());
        b.on_function_sync("pair", |_| {
            Ok(Value::Array(vec![Value::from("x"), Value::from(2)]))
        })
        .unwrap();

        let pair: (String, u32) = a.call_as("pair", vec![]).await.unwrap();
        assert_eq!(pair, ("x".to_string(), 2));

        match a.call_as::<bool>("pair", vec![]).await {
            Err(CallError::ResultType(_)) => {}
            other => panic!("Expected ResultType error, got {:?}", other),
        }
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_missing_function_reports_its_name() {
    local(async {
        let (_pair, a, _b) = connect(EndpointConfig::new(), EndpointConfig::new());

        let err = a.call("missingFn", vec![]).await.unwrap_err();

        let descriptor = err.remote_error().unwrap();
        assert_eq!(descriptor.code, ErrorCode::NoListener);
        assert_eq!(descriptor.message, "no listener for function:missingFn");
        assert!(err.to_string().contains("missingFn"));
        assert_eq!(a.pending_calls(), 0);
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_broadcast_reaches_listeners_in_order() {
    local(async {
        let (_pair, a, b) = connect(EndpointConfig::new(), EndpointConfig::new());
        let log = Rc::new(RefCell::new(Vec::new()));

        for tag in ["L1", "L2"] {
            let log = Rc::clone(&log);
            b.on_broadcast(move |data| {
                let x = data.get("x").and_then(Value::as_i64).unwrap_or_default();
                log.borrow_mut().push(format!("{}:{}", tag, x));
                Ok(())
            })
            .unwrap();
        }

        a.broadcast(Value::object([("x", Value::from(1))])).unwrap();
        quiesce().await;

        assert_eq!(*log.borrow(), vec!["L1:1", "L2:1"]);
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_late_and_removed_listeners_miss_broadcast() {
    local(async {
        let (_pair, a, b) = connect(EndpointConfig::new(), EndpointConfig::new());
        let log = Rc::new(RefCell::new(Vec::new()));
        let record = |tag: &'static str| {
            let log = Rc::clone(&log);
            move |_: &Value| -> ListenerResult<()> {
                log.borrow_mut().push(tag);
                Ok(())
            }
        };

        let first = b.on_broadcast(record("first")).unwrap();
        a.broadcast(1).unwrap();
        quiesce().await;

        b.on_broadcast(record("late")).unwrap();
        assert!(b.off(&EventKey::Broadcast, first));
        a.broadcast(2).unwrap();
        quiesce().await;

        assert_eq!(*log.borrow(), vec!["first", "late"]);
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_failing_broadcast_listener_does_not_stop_others() {
    local(async {
        let (_pair, a, b) = connect(EndpointConfig::new(), EndpointConfig::new());
        let reached = Rc::new(RefCell::new(false));

        b.on_broadcast(|_| Err("listener exploded".into())).unwrap();
        let flag = Rc::clone(&reached);
        b.on_broadcast(move |_| {
            *flag.borrow_mut() = true;
            Ok(())
        })
        .unwrap();

        a.broadcast(Value::Null).unwrap();
        quiesce().await;

        assert!(*reached.borrow());
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_duplicate_function_registration() {
    local(async {
        let (_pair, _a, b) = connect(EndpointConfig::new(), EndpointConfig::new());
        let id = b.on_function_sync("f", |_| Ok(Value::from(1))).unwrap();

        match b.on_function_sync("f", |_| Ok(Value::from(2))) {
            Err(EndpointError::DuplicateListener(key)) => {
                assert_eq!(key, EventKey::function("f"))
            }
            other => panic!("Expected DuplicateListener, got {:?}", other),
        }

        assert!(b.off(&EventKey::function("f"), id));
        assert!(b.on_function_sync("f", |_| Ok(Value::from(3))).is_ok());
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_function_listener_error_is_reported() {
    local(async {
        let (_pair, a, b) = connect(EndpointConfig::new(), EndpointConfig::new());
        b.on_function("explode", |_| async { Err(ListenerError::new("kaboom")) })
            .unwrap();

        let err = a.call("explode", vec![]).await.unwrap_err();
        let descriptor = err.remote_error().unwrap();
        assert_eq!(descriptor.code, ErrorCode::ListenerFailed);
        assert_eq!(descriptor.message, "kaboom");
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_unserializable_result_is_reported() {
    local(async {
        let pair = linked_contexts(ORIGIN_A, ORIGIN_B);
        let a = Endpoint::builder(pair.a.clone())
            .with_target(pair.a_to_b.clone())
            .with_codec(Rc::new(JsonCodec))
            .build()
            .unwrap();
        let b = Endpoint::builder(pair.b.clone())
            .with_target(pair.b_to_a.clone())
            .with_codec(Rc::new(JsonCodec))
            .build()
            .unwrap();
        b.on_function_sync("big", |_| Ok(Value::BigInt(1))).unwrap();

        let err = a.call("big", vec![]).await.unwrap_err();
        let descriptor = err.remote_error().unwrap();
        assert_eq!(descriptor.code, ErrorCode::Serialization);
        assert!(descriptor.details.is_some());
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_async_listener_does_not_block_other_calls() {
    local(async {
        let (_pair, a, b) = connect(EndpointConfig::new(), EndpointConfig::new());
        b.on_function("wait", |_| async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok(Value::from("waited"))
        })
        .unwrap();
        b.on_function_sync("now", |_| Ok(Value::from("now"))).unwrap();

        let slow_caller = a.clone();
        let slow = tokio::task::spawn_local(async move { slow_caller.call("wait", vec![]).await });
        quiesce().await;

        assert_eq!(a.call("now", vec![]).await.unwrap(), Value::from("now"));
        assert!(!slow.is_finished());
        assert_eq!(slow.await.unwrap().unwrap(), Value::from("waited"));
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_slow_call_times_out() {
    local(async {
        let timeout = Duration::from_millis(50);
        let (_pair, a, b) = connect(
            EndpointConfig::new().with_function_timeout(timeout),
            EndpointConfig::new(),
        );
        let finished = Rc::new(RefCell::new(false));
        let flag = Rc::clone(&finished);
        b.on_function("slow", move |_| {
            let flag = Rc::clone(&flag);
            async move {
                tokio::time::sleep(Duration::from_millis(80)).await;
                *flag.borrow_mut() = true;
                Ok(Value::from("late"))
            }
        })
        .unwrap();

        let started = tokio::time::Instant::now();
        let err = a.call("slow", vec![]).await.unwrap_err();

        match err {
            CallError::Timeout {
                function,
                elapsed_ms,
            } => {
                assert_eq!(function, "slow");
                assert!(elapsed_ms >= 50);
            }
            other => panic!("Expected Timeout, got {:?}", other),
        }
        assert!(started.elapsed() >= timeout);
        assert_eq!(a.pending_calls(), 0);

        // The late result arrives and is ignored
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(*finished.borrow());
        assert_eq!(a.pending_calls(), 0);
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_calls_settle_independently() {
    local(async {
        let (_pair, a, b) = connect(EndpointConfig::new(), EndpointConfig::new());
        let calls = Rc::new(RefCell::new(0));
        register_double(&b, &calls);

        let (x, y, z) = futures::join!(
            a.call("double", vec![Value::from(1)]),
            a.call("double", vec![Value::from(2)]),
            a.call("double", vec![Value::from(3)]),
        );

        assert_eq!(x.unwrap(), Value::from(2));
        assert_eq!(y.unwrap(), Value::from(4));
        assert_eq!(z.unwrap(), Value::from(6));
        assert_eq!(*calls.borrow(), 3);
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_channel_mismatch_is_ignored() {
    local(async {
        let (pair, _a, b) = connect(on_channel("c1"), on_channel("c1"));
        let calls = Rc::new(RefCell::new(0));
        register_double(&b, &calls);

        let raw = Envelope::call(
            ChannelKey::derive(Some("other")),
            "double",
            CorrelationId::new(),
            vec![Value::from(5)],
        )
        .encode(&TaggedJsonCodec)
        .unwrap();
        pair.b.inject(raw, ORIGIN_A);
        quiesce().await;

        assert_eq!(*calls.borrow(), 0);
        assert_eq!(pair.a.delivered(), 0);
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_origin_filter_drops_foreign_sender() {
    local(async {
        let (pair, _a, b) = connect(
            EndpointConfig::new(),
            EndpointConfig::new().with_origin(ORIGIN_A),
        );
        let calls = Rc::new(RefCell::new(0));
        register_double(&b, &calls);

        let raw = Envelope::call(
            ChannelKey::default_channel(),
            "double",
            CorrelationId::new(),
            vec![Value::from(5)],
        )
        .encode(&TaggedJsonCodec)
        .unwrap();
        pair.b.inject(raw.clone(), "https://evil.example");
        quiesce().await;
        assert_eq!(*calls.borrow(), 0);
        assert_eq!(pair.a.delivered(), 0);

        pair.b.inject(raw, ORIGIN_A);
        quiesce().await;
        assert_eq!(*calls.borrow(), 1);
        assert_eq!(pair.a.delivered(), 1);
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_evaluate_runs_through_evaluator() {
    local(async {
        let pair = linked_contexts(ORIGIN_A, ORIGIN_B);
        let a = Endpoint::builder(pair.a.clone())
            .with_target(pair.a_to_b.clone())
            .build()
            .unwrap();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let record = Rc::clone(&seen);
        let _b = Endpoint::builder(pair.b.clone())
            .with_target(pair.b_to_a.clone())
            .with_config(EndpointConfig::new().with_evaluate(true))
            .with_evaluator(Rc::new(move |source: &str| -> ListenerResult<Value> {
                record.borrow_mut().push(source.to_string());
                Ok(Value::from(42))
            }))
            .build()
            .unwrap();

        let result = a
            .evaluate("function(n) { return n * 21; }", &[Value::from(2)])
            .await
            .unwrap();

        assert_eq!(result, Value::from(42));
        assert_eq!(*seen.borrow(), vec!["(function(n) { return n * 21; })(2)"]);
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_evaluate_disabled_on_peer() {
    local(async {
        let (_pair, a, _b) = connect(EndpointConfig::new(), EndpointConfig::new());

        let err = a.evaluate("() => 1", &[]).await.unwrap_err();
        let descriptor = err.remote_error().unwrap();
        assert_eq!(descriptor.code, ErrorCode::NoListener);
        assert_eq!(descriptor.message, "no listener for function:evaluate");
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_send_failure_is_returned_and_not_left_pending() {
    local(async {
        let (pair, a, _b) = connect(EndpointConfig::new(), EndpointConfig::new());
        pair.a_to_b.close();

        assert!(matches!(
            a.call("double", vec![Value::from(1)]).await,
            Err(CallError::Transport(_))
        ));
        assert!(matches!(a.broadcast(1), Err(EndpointError::Transport(_))));
        assert_eq!(a.pending_calls(), 0);
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_listener_can_call_back_into_endpoint() {
    local(async {
        let (_pair, a, b) = connect(EndpointConfig::new(), EndpointConfig::new());
        let log = Rc::new(RefCell::new(Vec::new()));

        let record = Rc::clone(&log);
        a.on_broadcast(move |data| {
            record
                .borrow_mut()
                .push(data.as_str().unwrap_or_default().to_string());
            Ok(())
        })
        .unwrap();

        let echo = b.downgrade();
        b.on_broadcast(move |data| match echo.upgrade() {
            Some(endpoint) => endpoint
                .broadcast(data.clone())
                .map_err(|err| err.to_string().into()),
            None => Ok(()),
        })
        .unwrap();

        a.broadcast("ping").unwrap();
        quiesce().await;

        assert_eq!(*log.borrow(), vec!["ping"]);
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_self_referencing_listener_does_not_leak_endpoint() {
    local(async {
        let (pair, _a, b) = connect(EndpointConfig::new(), EndpointConfig::new());
        let echo = b.downgrade();
        b.on_broadcast(move |data| match echo.upgrade() {
            Some(endpoint) => endpoint
                .broadcast(data.clone())
                .map_err(|err| err.to_string().into()),
            None => Ok(()),
        })
        .unwrap();
        assert_eq!(pair.b.subscriber_count(), 1);

        let weak = b.downgrade();
        drop(b);

        assert!(weak.upgrade().is_none());
        assert_eq!(pair.b.subscriber_count(), 0);
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_replaced_endpoint_can_be_dropped_without_silencing_successor() {
    local(async {
        let pair = linked_contexts(ORIGIN_A, ORIGIN_B);
        let a = Endpoint::builder(pair.a.clone())
            .with_target(pair.a_to_b.clone())
            .build()
            .unwrap();
        let id = SubscriptionId::new();
        let old = Endpoint::builder(pair.b.clone())
            .with_target(pair.b_to_a.clone())
            .with_subscription_id(id)
            .build()
            .unwrap();
        let new = Endpoint::builder(pair.b.clone())
            .with_target(pair.b_to_a.clone())
            .with_subscription_id(id)
            .build()
            .unwrap();
        let calls = Rc::new(RefCell::new(0));
        register_double(&new, &calls);

        quiesce().await;
        assert!(old.is_closed());
        drop(old);
        assert_eq!(pair.b.subscriber_count(), 1);

        let result = a.call("double", vec![Value::from(4)]).await.unwrap();
        assert_eq!(result, Value::from(8));
        assert_eq!(*calls.borrow(), 1);
        assert!(!new.is_closed());
    })
    .await;
}
