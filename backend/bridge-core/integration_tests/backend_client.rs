use bridge_core::GameCode;
use bridge_core::backend_client::BackendClient;
use bridge_core::error::backend::BackendError;

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GET_BY_CODE_PATH: &str = "/api/games/get_by_code";

fn code() -> GameCode {
    GameCode::parse("ABC123").unwrap()
}

/// **VALUE**: The fallback speaks the backend's envelope: request body shape in,
/// `data` out.
///
/// **BUG THIS CATCHES**: Would catch a renamed body field or an envelope that is
/// handed to callers instead of its data.
#[tokio::test]
async fn given_backend_has_game_when_fetched_then_envelope_data_returned() {
    // GIVEN
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GET_BY_CODE_PATH))
        .and(body_json(json!({"game_code": "ABC123", "simulated_items": [3115]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {"game_time": 120.0},
            "message": null
        })))
        .expect(1)
        .mount(&server)
        .await;
    let client = BackendClient::new(&server.uri()).unwrap();

    // WHEN
    let data = client.get_by_code(&code(), &[3115]).await.unwrap();

    // THEN
    assert_eq!(data, json!({"game_time": 120.0}));
}

/// **VALUE**: A numeric game code reaches the backend as a JSON number.
///
/// **BUG THIS CATCHES**: Would catch the body carrying `"game_code": "1234"`, which a
/// backend deserializing an integer rejects.
#[tokio::test]
async fn given_numeric_code_when_fetched_then_body_carries_number() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GET_BY_CODE_PATH))
        .and(body_json(json!({"game_code": 1234, "simulated_items": []})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {"game_time": 3.0}
        })))
        .expect(1)
        .mount(&server)
        .await;
    let client = BackendClient::new(&server.uri()).unwrap();

    let data = client
        .get_by_code(&GameCode::Numeric(1234), &[])
        .await
        .unwrap();

    assert_eq!(data, json!({"game_time": 3.0}));
}

#[tokio::test]
async fn given_envelope_without_data_when_fetched_then_not_found_with_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GET_BY_CODE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "data": null,
            "message": "Game not found"
        })))
        .mount(&server)
        .await;
    let client = BackendClient::new(&server.uri()).unwrap();

    match client.get_by_code(&code(), &[]).await {
        Err(BackendError::NotFound { message, .. }) => assert_eq!(message, "Game not found"),
        other => panic!("Expected NotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn given_envelope_without_message_when_fetched_then_unknown_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GET_BY_CODE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": false})))
        .mount(&server)
        .await;
    let client = BackendClient::new(&server.uri()).unwrap();

    match client.get_by_code(&code(), &[]).await {
        Err(BackendError::NotFound { message, .. }) => assert_eq!(message, "Unknown error"),
        other => panic!("Expected NotFound, got {other:?}"),
    }
}

/// **VALUE**: A briefly unavailable backend does not cost a snapshot.
#[tokio::test]
async fn given_transient_503_when_fetched_then_retried_until_success() {
    // GIVEN: Two 503s, then success
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GET_BY_CODE_PATH))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(GET_BY_CODE_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"success": true, "data": [1]})),
        )
        .expect(1)
        .mount(&server)
        .await;
    let client = BackendClient::new(&server.uri()).unwrap();

    // WHEN
    let data = client.get_by_code(&code(), &[3115]).await.unwrap();

    // THEN
    assert_eq!(data, json!([1]));
}

/// **BUG THIS CATCHES**: Would catch client errors being retried, which only
/// delays the failure the caller has to handle anyway.
#[tokio::test]
async fn given_404_when_fetched_then_server_error_without_retry() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GET_BY_CODE_PATH))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such route"))
        .expect(1)
        .mount(&server)
        .await;
    let client = BackendClient::new(&server.uri()).unwrap();

    match client.get_by_code(&code(), &[]).await {
        Err(BackendError::Server {
            status, message, ..
        }) => {
            assert_eq!(status.0, 404);
            assert_eq!(message, "no such route");
        }
        other => panic!("Expected Server, got {other:?}"),
    }
}

#[tokio::test]
async fn given_persistent_503_when_retry_budget_spent_then_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GET_BY_CODE_PATH))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    let client = BackendClient::new(&server.uri())
        .unwrap()
        .with_retry_max_elapsed(Duration::from_millis(300));

    match client.get_by_code(&code(), &[]).await {
        Err(BackendError::Server { status, .. }) => assert!(status.is_retryable()),
        other => panic!("Expected Server, got {other:?}"),
    }
}

#[test]
fn given_base_url_with_path_when_created_then_trailing_slash_added() {
    let client = BackendClient::new("http://localhost:8082/game").unwrap();

    assert_eq!(client.base_url().as_str(), "http://localhost:8082/game/");
    assert!(BackendClient::new("not a url").is_err());
}
