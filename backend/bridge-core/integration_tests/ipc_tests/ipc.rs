use crate::ipc_tests::helpers::{
    TEST_AUTH_TOKEN, authenticate, connect_to_server, game_registry, is_connection_closed,
    receive_frame, send_frame, send_text, start_test_server,
};

use bridge_core::ipc::protocol::{ClientFrame, RejectCode, ServerFrame};

use serde_json::json;

/// **VALUE**: Verifies the handshake succeeds with the shared token.
///
/// **WHY THIS MATTERS**: Every frontend call goes over this connection. If the
/// handshake fails for a valid token, the frontend sees the host as absent.
#[tokio::test]
async fn given_valid_token_when_authenticating_then_auth_succeeds() {
    // GIVEN: Server running with a known token
    let handle = start_test_server(game_registry()).await;
    let mut ws = connect_to_server(&handle).await;

    // WHEN: Client authenticates
    let response = authenticate(&mut ws, TEST_AUTH_TOKEN).await;

    // THEN: Auth result is successful
    assert_eq!(
        response,
        ServerFrame::AuthResult {
            success: true,
            error: None
        }
    );
    handle.shutdown();
}

/// **VALUE**: Verifies a wrong token is refused and the connection closed.
///
/// **BUG THIS CATCHES**: Would catch a server that reports failure but keeps
/// serving commands on the unauthenticated connection.
#[tokio::test]
async fn given_invalid_token_when_authenticating_then_refused_and_closed() {
    // GIVEN
    let handle = start_test_server(game_registry()).await;
    let mut ws = connect_to_server(&handle).await;

    // WHEN
    let response = authenticate(&mut ws, "wrong-token").await;

    // THEN
    match response {
        ServerFrame::AuthResult { success, error } => {
            assert!(!success);
            assert_eq!(error.as_deref(), Some("Invalid authentication token"));
        }
        other => panic!("Expected AuthResult, got {other:?}"),
    }
    assert!(is_connection_closed(&mut ws).await);
}

#[tokio::test]
async fn given_invoke_before_auth_when_sent_then_connection_closed() {
    let handle = start_test_server(game_registry()).await;
    let mut ws = connect_to_server(&handle).await;

    send_frame(
        &mut ws,
        &ClientFrame::Invoke {
            request_id: 1,
            command: String::from("start_game"),
            args: None,
        },
    )
    .await;

    assert!(is_connection_closed(&mut ws).await);
}

/// **VALUE**: Each invoke is answered once with its own request id, in order.
#[tokio::test]
async fn given_authenticated_when_invoking_commands_then_answers_match_request_ids() {
    // GIVEN
    let handle = start_test_server(game_registry()).await;
    let mut ws = connect_to_server(&handle).await;
    authenticate(&mut ws, TEST_AUTH_TOKEN).await;

    // WHEN
    let mut args = serde_json::Map::new();
    args.insert(String::from("gameCode"), json!("ABC123"));
    send_frame(
        &mut ws,
        &ClientFrame::Invoke {
            request_id: 10,
            command: String::from("get_realtime_game"),
            args: Some(args),
        },
    )
    .await;
    send_frame(
        &mut ws,
        &ClientFrame::Invoke {
            request_id: 11,
            command: String::from("get_game_code"),
            args: None,
        },
    )
    .await;

    // THEN
    match receive_frame(&mut ws).await {
        ServerFrame::Resolved { request_id, value } => {
            assert_eq!(request_id, 10);
            let text = value.as_str().expect("snapshot is a JSON string");
            let snapshot: serde_json::Value = serde_json::from_str(text).unwrap();
            assert_eq!(snapshot["game_code"], json!("ABC123"));
        }
        other => panic!("Expected Resolved, got {other:?}"),
    }
    assert_eq!(
        receive_frame(&mut ws).await,
        ServerFrame::Resolved {
            request_id: 11,
            value: json!("ABC123")
        }
    );
}

#[tokio::test]
async fn given_unknown_command_when_invoked_then_rejected_unknown_command() {
    let handle = start_test_server(game_registry()).await;
    let mut ws = connect_to_server(&handle).await;
    authenticate(&mut ws, TEST_AUTH_TOKEN).await;

    send_frame(
        &mut ws,
        &ClientFrame::Invoke {
            request_id: 5,
            command: String::from("buy_item"),
            args: None,
        },
    )
    .await;

    match receive_frame(&mut ws).await {
        ServerFrame::Rejected {
            request_id, code, ..
        } => {
            assert_eq!(request_id, 5);
            assert_eq!(code, RejectCode::UnknownCommand);
        }
        other => panic!("Expected Rejected, got {other:?}"),
    }
}

/// **BUG THIS CATCHES**: Would catch one malformed frame tearing down the
/// connection and every later call with it.
#[tokio::test]
async fn given_garbage_frame_when_sent_then_rejected_and_connection_survives() {
    // GIVEN
    let handle = start_test_server(game_registry()).await;
    let mut ws = connect_to_server(&handle).await;
    authenticate(&mut ws, TEST_AUTH_TOKEN).await;

    // WHEN
    send_text(&mut ws, "{not json").await;

    // THEN
    match receive_frame(&mut ws).await {
        ServerFrame::Rejected { code, .. } => assert_eq!(code, RejectCode::InvalidMessage),
        other => panic!("Expected Rejected, got {other:?}"),
    }

    send_frame(
        &mut ws,
        &ClientFrame::Invoke {
            request_id: 2,
            command: String::from("start_game"),
            args: None,
        },
    )
    .await;
    assert_eq!(
        receive_frame(&mut ws).await,
        ServerFrame::Resolved {
            request_id: 2,
            value: serde_json::Value::Null
        }
    );
}

#[tokio::test]
async fn given_second_auth_frame_when_sent_then_rejected_auth_error() {
    let handle = start_test_server(game_registry()).await;
    let mut ws = connect_to_server(&handle).await;
    authenticate(&mut ws, TEST_AUTH_TOKEN).await;

    send_frame(
        &mut ws,
        &ClientFrame::Auth {
            token: String::from(TEST_AUTH_TOKEN),
        },
    )
    .await;

    match receive_frame(&mut ws).await {
        ServerFrame::Rejected { code, .. } => assert_eq!(code, RejectCode::AuthError),
        other => panic!("Expected Rejected, got {other:?}"),
    }
}

#[tokio::test]
async fn given_no_token_when_server_started_then_token_generated() {
    let handle = bridge_core::ipc::start_ipc_server(0, None, game_registry())
        .await
        .unwrap();

    assert!(!handle.auth_token().is_empty());
    assert_ne!(handle.local_addr().port(), 0);
    assert!(handle.url().starts_with("ws://127.0.0.1:"));
}
