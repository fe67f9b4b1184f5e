use bridge_core::backend_client::BackendClient;
use bridge_core::realtime::{RealtimeSettings, RealtimeWatcher, WatchEnd};
use bridge_core::{Bridge, CommandFacade, CommandRegistry, GameCode};

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fast_settings(max_failures: u32) -> RealtimeSettings {
    RealtimeSettings {
        poll_interval: Duration::from_millis(20),
        max_failures,
        simulated_items: vec![3115],
    }
}

fn code() -> GameCode {
    GameCode::parse("ABC123").unwrap()
}

/// Registry whose snapshot handler counts calls and reports the tick number.
fn counting_registry(calls: Arc<AtomicU32>) -> CommandRegistry {
    let mut registry = CommandRegistry::new();
    registry.register("get_realtime_game", move |_| {
        let calls = Arc::clone(&calls);
        async move {
            let tick = calls.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(Value::String(json!({"tick": tick}).to_string()))
        }
    });
    registry
}

/// **VALUE**: Verifies the watcher delivers decoded snapshots in order and stops on request.
///
/// **WHY THIS MATTERS**: The overlay renders whatever arrives here once per second;
/// out-of-order or still-encoded snapshots show up directly on screen.
#[tokio::test]
async fn given_host_bridge_when_watching_then_snapshots_arrive_in_order_until_stopped() {
    // GIVEN
    let calls = Arc::new(AtomicU32::new(0));
    let facade = CommandFacade::new(Bridge::new(counting_registry(Arc::clone(&calls))));
    let watcher = RealtimeWatcher::new(facade, None, fast_settings(3));

    // WHEN
    let mut subscription = watcher.watch(code());
    let first = subscription.next().await.unwrap();
    let second = subscription.next().await.unwrap();
    subscription.stop();

    // THEN
    assert_eq!(first, json!({"tick": 1}));
    assert_eq!(second, json!({"tick": 2}));
    assert_eq!(subscription.finish().await, WatchEnd::Stopped);
}

/// **BUG THIS CATCHES**: Would catch a watcher that keeps hammering a host that
/// cannot answer, or that gives up on the first hiccup.
#[tokio::test]
async fn given_failing_host_when_watching_then_ends_after_max_consecutive_failures() {
    // GIVEN: Every call is rejected
    let calls = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&calls);
    let mut registry = CommandRegistry::new();
    registry.register("get_realtime_game", move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        async { Err(String::from("game not running")) }
    });
    let facade = CommandFacade::new(Bridge::new(registry));
    let watcher = RealtimeWatcher::new(facade, None, fast_settings(3));

    // WHEN
    let mut subscription = watcher.watch(code());
    let next = tokio::time::timeout(Duration::from_secs(2), subscription.next())
        .await
        .expect("watch should end on its own");

    // THEN
    assert_eq!(next, None);
    assert_eq!(subscription.finish().await, WatchEnd::TooManyFailures);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn given_intermittent_failures_when_watching_then_success_resets_failure_count() {
    // GIVEN: Odd calls fail, even calls succeed
    let calls = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&calls);
    let mut registry = CommandRegistry::new();
    registry.register("get_realtime_game", move |_| {
        let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
        async move {
            if n % 2 == 1 {
                Err(String::from("flaky"))
            } else {
                Ok(json!({"n": n}))
            }
        }
    });
    let facade = CommandFacade::new(Bridge::new(registry));
    let watcher = RealtimeWatcher::new(facade, None, fast_settings(2));

    // WHEN
    let mut subscription = watcher.watch(code());
    let mut received = Vec::new();
    for _ in 0..3 {
        received.push(subscription.next().await.unwrap());
    }

    // THEN
    assert_eq!(received, vec![json!({"n": 2}), json!({"n": 4}), json!({"n": 6})]);
    assert_eq!(subscription.finish().await, WatchEnd::Stopped);
}

/// **VALUE**: Without a host, the watcher still produces snapshots from the backend.
#[tokio::test]
async fn given_no_bridge_and_backend_fallback_when_watching_then_backend_snapshots_delivered() {
    // GIVEN
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/games/get_by_code"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {"source": "backend"}
        })))
        .mount(&server)
        .await;
    let fallback = BackendClient::new(&server.uri()).unwrap();
    let watcher = RealtimeWatcher::new(
        CommandFacade::new(Bridge::absent()),
        Some(fallback),
        fast_settings(3),
    );

    // WHEN
    let mut subscription = watcher.watch(code());
    let snapshot = subscription.next().await.unwrap();

    // THEN
    assert_eq!(snapshot, json!({"source": "backend"}));
    assert_eq!(subscription.finish().await, WatchEnd::Stopped);
}

#[tokio::test]
async fn given_no_bridge_and_no_fallback_when_watching_then_ends_with_failures() {
    let watcher = RealtimeWatcher::new(CommandFacade::default(), None, fast_settings(2));

    let subscription = watcher.watch(code());
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(subscription.finish().await, WatchEnd::TooManyFailures);
}
