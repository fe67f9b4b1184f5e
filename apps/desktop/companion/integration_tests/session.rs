use companion::session::Session;

use bridge_core::CommandRegistry;
use bridge_core::config::AppConfig;
use bridge_core::ipc::start_ipc_server;

use common::RedactedToken;

use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============================================================================
// Integration tests for the companion session over a real command bus
// ============================================================================

const TOKEN: &str = "companion-test-token";

fn game_host() -> CommandRegistry {
    let mut registry = CommandRegistry::new();
    registry
        .register("start_game", |_| async { Ok(Value::Null) })
        .register("get_game_code", |_| async { Ok(json!("ABC123")) })
        .register("get_realtime_game", |args| async move {
            let code = args
                .and_then(|a| a.get("gameCode").cloned())
                .unwrap_or(Value::Null);
            Ok(Value::String(json!({"code": code}).to_string()))
        })
        .register("get_calculator_value", |_| async { Ok(json!(99)) });
    registry
}

/// **VALUE**: Tests the whole frontend path: bus connection, game code, snapshot,
/// calculator value.
///
/// **WHY THIS MATTERS**: This is the closest we get to a real run without a game
/// host process. Each piece is tested alone elsewhere; this checks they fit.
///
/// **BUG THIS CATCHES**: Would catch config fields not reaching the bus client
/// (URL, token) or the session resolving a code the watcher then mangles.
#[tokio::test]
async fn given_host_on_bus_when_session_runs_then_code_snapshot_and_value_flow_through() {
    // GIVEN: A host serving the game commands
    let handle = start_ipc_server(0, Some(RedactedToken::new(TOKEN)), game_host())
        .await
        .expect("Failed to start IPC server");
    let mut config = AppConfig::default();
    config.bridge.ipc_url = Some(handle.url());
    config.realtime.poll_interval_ms = 100;

    // WHEN: The companion connects and follows the game
    let session = Session::connect(&config, Some(RedactedToken::new(TOKEN)))
        .await
        .unwrap();
    session.start_game().await.unwrap();
    let code = session.resolve_game_code().await.unwrap();
    let mut subscription = session.watch(code);
    let snapshot = subscription.next().await.expect("snapshot");
    session.record_snapshot(snapshot.clone()).await.unwrap();
    subscription.finish().await;

    // THEN
    assert!(session.has_host());
    assert_eq!(snapshot, json!({"code": "ABC123"}));
    assert_eq!(session.calculate(&snapshot).await.unwrap(), Some(json!(99)));
    handle.shutdown();
}

/// **VALUE**: A wrong token leaves the session hostless instead of failing startup.
#[tokio::test]
async fn given_wrong_token_when_connecting_then_session_runs_without_host() {
    let handle = start_ipc_server(0, Some(RedactedToken::new(TOKEN)), game_host())
        .await
        .expect("Failed to start IPC server");
    let mut config = AppConfig::default();
    config.bridge.ipc_url = Some(handle.url());

    let session = Session::connect(&config, Some(RedactedToken::new("wrong")))
        .await
        .unwrap();

    assert!(!session.has_host());
    assert_eq!(session.facade().start_game().await.unwrap(), None);
}

#[tokio::test]
async fn given_url_without_token_when_connecting_then_no_host() {
    let mut config = AppConfig::default();
    config.bridge.ipc_url = Some(String::from("ws://127.0.0.1:9"));

    let session = Session::connect(&config, None).await.unwrap();

    assert!(!session.has_host());
}

/// **VALUE**: Without a host, snapshots come from the HTTP backend.
#[tokio::test]
async fn given_no_host_and_backend_when_watching_then_backend_snapshots() {
    // GIVEN
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/games/get_by_code"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {"from": "backend"}
        })))
        .mount(&server)
        .await;
    let mut config = AppConfig::default();
    config.backend.base_url = server.uri();
    config.realtime.game_code = Some(String::from("ZZZ999"));
    config.realtime.poll_interval_ms = 100;

    // WHEN
    let session = Session::connect(&config, None).await.unwrap();
    let code = session.resolve_game_code().await.unwrap();
    let mut subscription = session.watch(code);
    let snapshot = subscription.next().await;
    subscription.finish().await;

    // THEN
    assert_eq!(snapshot, Some(json!({"from": "backend"})));
}
