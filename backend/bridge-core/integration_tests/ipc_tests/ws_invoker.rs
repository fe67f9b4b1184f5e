use crate::ipc_tests::helpers::{
    TEST_GAME_CODE, connect_invoker, game_registry, invoker_options,
    start_host_that_closes_after_auth, start_test_server,
};

use bridge_core::error::invoke::InvokeError;
use bridge_core::error::ipc::IpcError;
use bridge_core::ipc::{WsInvoker, WsInvokerOptions};
use bridge_core::{Bridge, CommandFacade, CommandRegistry, Invoke};

use std::sync::Arc;
use std::time::{Duration, Instant};

use common::RedactedToken;

use serde_json::{Value, json};

/// **VALUE**: The facade over the bus behaves exactly like the facade over the
/// in-process registry.
///
/// **WHY THIS MATTERS**: This is the production path. A frontend process talks
/// to the host only through this client.
#[tokio::test]
async fn given_facade_over_bus_when_calling_every_command_then_host_results_returned() {
    // GIVEN: Host serving the game registry and a connected facade
    let handle = start_test_server(game_registry()).await;
    let facade = CommandFacade::new(Bridge::new(connect_invoker(&handle).await));

    // WHEN / THEN
    assert_eq!(facade.start_game().await.unwrap(), Some(Value::Null));
    assert_eq!(facade.send_code().await.unwrap(), Some(json!(TEST_GAME_CODE)));
    assert_eq!(
        facade.get_game_code().await.unwrap(),
        Some(json!(TEST_GAME_CODE))
    );

    let snapshot = facade
        .get_realtime_game(TEST_GAME_CODE)
        .await
        .unwrap()
        .expect("bridge present");
    assert!(snapshot.is_string());

    assert_eq!(
        facade
            .get_calculator_value(json!({"level": 9}))
            .await
            .unwrap(),
        Some(json!(18.0))
    );
}

/// **BUG THIS CATCHES**: Would catch rejections losing the command name or the
/// handler's message on the way back over the bus.
#[tokio::test]
async fn given_handler_failure_when_invoked_over_bus_then_rejected_with_command_and_message() {
    let handle = start_test_server(game_registry()).await;
    let invoker = connect_invoker(&handle).await;

    let result = invoker.invoke("get_calculator_value", None).await;

    match result {
        Err(InvokeError::Rejected {
            command, message, ..
        }) => {
            assert_eq!(command, "get_calculator_value");
            assert_eq!(message, "gameState.level is required");
        }
        other => panic!("Expected Rejected, got {other:?}"),
    }
}

#[tokio::test]
async fn given_unknown_command_when_invoked_over_bus_then_unknown_command_error() {
    let handle = start_test_server(game_registry()).await;
    let invoker = connect_invoker(&handle).await;

    match invoker.invoke("buy_item", None).await {
        Err(InvokeError::UnknownCommand { command, .. }) => assert_eq!(command, "buy_item"),
        other => panic!("Expected UnknownCommand, got {other:?}"),
    }
}

/// **VALUE**: Concurrent calls share one connection and each gets its own answer.
#[tokio::test]
async fn given_concurrent_calls_when_invoked_then_each_resolves_to_its_own_answer() {
    // GIVEN
    let mut registry = CommandRegistry::new();
    registry.register("echo", |args| async move {
        Ok(args.map(Value::Object).unwrap_or(Value::Null))
    });
    let handle = start_test_server(registry).await;
    let invoker = Arc::new(connect_invoker(&handle).await);

    // WHEN
    let calls = (0..8).map(|i| {
        let invoker = Arc::clone(&invoker);
        tokio::spawn(async move {
            let mut args = serde_json::Map::new();
            args.insert(String::from("n"), json!(i));
            invoker.invoke("echo", Some(args)).await
        })
    });
    let results = futures_util::future::join_all(calls).await;

    // THEN
    for (i, result) in results.into_iter().enumerate() {
        assert_eq!(result.unwrap().unwrap(), json!({"n": i}));
    }
    assert_eq!(invoker.pending_count().await, 0);
}

/// **BUG THIS CATCHES**: Would catch a timed-out request staying in the pending
/// table forever.
#[tokio::test]
async fn given_slow_handler_when_request_timeout_passes_then_timeout_and_pending_cleared() {
    // GIVEN: A handler slower than the request timeout
    let mut registry = CommandRegistry::new();
    registry.register("start_game", |_| async {
        tokio::time::sleep(Duration::from_secs(2)).await;
        Ok(Value::Null)
    });
    let handle = start_test_server(registry).await;
    let mut options = invoker_options(&handle, crate::ipc_tests::helpers::TEST_AUTH_TOKEN);
    options.request_timeout = Duration::from_millis(200);
    let invoker = WsInvoker::connect(&options).await.unwrap();

    // WHEN
    let result = invoker.invoke("start_game", None).await;

    // THEN
    match result {
        Err(InvokeError::Timeout {
            command, timeout, ..
        }) => {
            assert_eq!(command, "start_game");
            assert_eq!(timeout, Duration::from_millis(200));
        }
        other => panic!("Expected Timeout, got {other:?}"),
    }
    assert_eq!(invoker.pending_count().await, 0);
}

/// **VALUE**: A bad token fails fast instead of retrying until the deadline.
#[tokio::test]
async fn given_wrong_token_when_connecting_with_retry_then_auth_error_without_retry() {
    let handle = start_test_server(game_registry()).await;
    let mut options = invoker_options(&handle, "wrong-token");
    options.connect_timeout = Duration::from_secs(30);

    let started = Instant::now();
    let result = WsInvoker::connect_with_retry(&options).await;

    assert!(matches!(result, Err(IpcError::Auth { .. })));
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn given_no_server_when_connecting_with_retry_then_gives_up_after_timeout() {
    // GIVEN: A port that was bound and released
    let handle = start_test_server(game_registry()).await;
    let mut options = invoker_options(&handle, "unused");
    handle.shutdown();
    tokio::time::sleep(Duration::from_millis(50)).await;
    options.connect_timeout = Duration::from_millis(300);

    // WHEN
    let result = WsInvoker::connect_with_retry(&options).await;

    // THEN
    assert!(matches!(result, Err(IpcError::Handshake { .. })));
}

/// **VALUE**: Once the host hangs up, the next call fails at once with a transport
/// error.
///
/// **BUG THIS CATCHES**: Would catch a call made after the reader stopped parking its
/// waiter where nothing will ever answer it, so the caller sits out the whole request
/// timeout and gets `Timeout` instead of `Transport`.
#[tokio::test]
async fn given_host_closed_after_auth_when_invoking_then_transport_error_without_waiting() {
    // GIVEN: A connected invoker whose host has since hung up
    let options = WsInvokerOptions {
        url: start_host_that_closes_after_auth().await,
        token: RedactedToken::new("any-token"),
        connect_timeout: Duration::from_secs(2),
        request_timeout: Duration::from_secs(3),
    };
    let invoker = WsInvoker::connect(&options).await.unwrap();
    for _ in 0..100 {
        if invoker.is_closed().await {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(invoker.is_closed().await);

    // WHEN
    let started = Instant::now();
    let result = invoker.invoke("start_game", None).await;

    // THEN
    assert!(
        matches!(result, Err(InvokeError::Transport { .. })),
        "Expected Transport, got {result:?}"
    );
    assert!(started.elapsed() < Duration::from_secs(1));
    assert_eq!(invoker.pending_count().await, 0);
}
