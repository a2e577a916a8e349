//! Call Timeout Tests
//!
//! These tests validate that calls without an answer always settle:
//! - Timeouts fire after the configured duration
//! - Concurrent calls time out independently
//! - Abandoned calls are reclaimed
//! - Closing an endpoint rejects what is still pending

use codec::Value;
use remote_ipc::{CallError, EndpointConfig, DEFAULT_FUNCTION_TIMEOUT_MS};
use std::time::Duration;
use tests_resilience::{quiesce, register_double, register_hang, run_local, test_bootstrap};
use tokio::time::Instant;

#[tokio::test(start_paused = true)]
async fn test_default_timeout_applies() {
    run_local(async {
        let bridge = test_bootstrap(EndpointConfig::new(), EndpointConfig::new());
        register_hang(&bridge.child, "hang");

        let started = Instant::now();
        let err = bridge.parent.call("hang", vec![]).await.unwrap_err();

        let timeout = Duration::from_millis(DEFAULT_FUNCTION_TIMEOUT_MS);
        assert!(err.is_timeout());
        assert!(started.elapsed() >= timeout);
        assert!(started.elapsed() < timeout + Duration::from_millis(10));
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_calls_time_out_independently() {
    run_local(async {
        let bridge = test_bootstrap(
            EndpointConfig::new().with_function_timeout(Duration::from_millis(100)),
            EndpointConfig::new(),
        );
        register_hang(&bridge.child, "hang");
        register_double(&bridge.child);

        let (hung, answered) = futures::join!(
            bridge.parent.call("hang", vec![]),
            bridge.parent.call("double", vec![Value::from(21)]),
        );

        match hung {
            Err(CallError::Timeout { function, .. }) => assert_eq!(function, "hang"),
            other => panic!("Expected Timeout, got {:?}", other),
        }
        assert_eq!(answered.unwrap(), Value::from(42));
        assert_eq!(bridge.parent.pending_calls(), 0);
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_staggered_timeouts_fire_in_order() {
    run_local(async {
        let bridge = test_bootstrap(
            EndpointConfig::new().with_function_timeout(Duration::from_millis(100)),
            EndpointConfig::new(),
        );
        register_hang(&bridge.child, "hang");

        let first = {
            let parent = bridge.parent.clone();
            tokio::task::spawn_local(async move { parent.call("hang", vec![]).await })
        };
        tokio::time::sleep(Duration::from_millis(60)).await;
        let second = {
            let parent = bridge.parent.clone();
            tokio::task::spawn_local(async move { parent.call("hang", vec![]).await })
        };
        quiesce().await;
        assert_eq!(bridge.parent.pending_calls(), 2);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(first.is_finished());
        assert!(!second.is_finished());
        assert_eq!(bridge.parent.pending_calls(), 1);

        assert!(second.await.unwrap().unwrap_err().is_timeout());
        assert!(first.await.unwrap().unwrap_err().is_timeout());
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_abandoned_call_is_reclaimed_by_timer() {
    run_local(async {
        let bridge = test_bootstrap(
            EndpointConfig::new().with_function_timeout(Duration::from_millis(100)),
            EndpointConfig::new(),
        );
        register_hang(&bridge.child, "hang");

        let parent = bridge.parent.clone();
        let abandoned = tokio::task::spawn_local(async move { parent.call("hang", vec![]).await });
        quiesce().await;
        abandoned.abort();
        quiesce().await;
        assert_eq!(bridge.parent.pending_calls(), 1);

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(bridge.parent.pending_calls(), 0);
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_close_rejects_pending_and_future_calls() {
    run_local(async {
        let bridge = test_bootstrap(EndpointConfig::new(), EndpointConfig::new());
        register_hang(&bridge.child, "hang");

        let parent = bridge.parent.clone();
        let pending = tokio::task::spawn_local(async move { parent.call("hang", vec![]).await });
        quiesce().await;

        bridge.parent.close();

        assert!(matches!(
            pending.await.unwrap(),
            Err(CallError::Closed { .. })
        ));
        assert!(matches!(
            bridge.parent.call("hang", vec![]).await,
            Err(CallError::Closed { .. })
        ));
        assert_eq!(bridge.contexts.a.subscriber_count(), 0);
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_result_after_close_is_ignored() {
    run_local(async {
        let bridge = test_bootstrap(EndpointConfig::new(), EndpointConfig::new());
        bridge
            .child
            .on_function("late", |_| async {
                tokio::time::sleep(Duration::from_millis(20)).await;
                Ok(Value::from("late"))
            })
            .unwrap();

        let parent = bridge.parent.clone();
        let call = tokio::task::spawn_local(async move { parent.call("late", vec![]).await });
        quiesce().await;
        bridge.parent.close();

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(matches!(call.await.unwrap(), Err(CallError::Closed { .. })));
        assert_eq!(bridge.contexts.a.delivered(), 1);
    })
    .await;
}
