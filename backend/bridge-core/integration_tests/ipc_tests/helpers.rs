//! Test helpers for command bus integration tests.
//!
//! - Starting a server with a small game registry
//! - Raw WebSocket access for protocol-level checks
//! - Connecting a [`WsInvoker`]

use bridge_core::CommandRegistry;
use bridge_core::ipc::protocol::{ClientFrame, ServerFrame};
use bridge_core::ipc::{IpcServerHandle, WsInvoker, WsInvokerOptions, start_ipc_server};

use common::RedactedToken;

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, accept_async, connect_async, tungstenite::Message,
};

pub type TestSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub const TEST_AUTH_TOKEN: &str = "test-token-12345";
pub const TEST_GAME_CODE: &str = "ABC123";

/// Registry answering the frontend's commands the way a game host would.
pub fn game_registry() -> CommandRegistry {
    let mut registry = CommandRegistry::new();
    registry
        .register("start_game", |_| async { Ok(Value::Null) })
        .register("send_code", |_| async { Ok(json!(TEST_GAME_CODE)) })
        .register("get_game_code", |_| async { Ok(json!(TEST_GAME_CODE)) })
        .register("get_realtime_game", |args| async move {
            match args.and_then(|a| a.get("gameCode").cloned()) {
                Some(code) => Ok(Value::String(
                    json!({"game_code": code, "game_time": 61.5}).to_string(),
                )),
                None => Err(String::from("gameCode is required")),
            }
        })
        .register("get_calculator_value", |args| async move {
            args.as_ref()
                .and_then(|a| a.get("gameState"))
                .and_then(|s| s.get("level"))
                .and_then(Value::as_f64)
                .map(|level| json!(level * 2.0))
                .ok_or_else(|| String::from("gameState.level is required"))
        });
    registry
}

pub async fn start_test_server(registry: CommandRegistry) -> IpcServerHandle {
    start_ipc_server(0, Some(RedactedToken::new(TEST_AUTH_TOKEN)), registry)
        .await
        .expect("Failed to start IPC server")
}

pub fn invoker_options(handle: &IpcServerHandle, token: &str) -> WsInvokerOptions {
    WsInvokerOptions {
        url: handle.url(),
        token: RedactedToken::new(token),
        connect_timeout: Duration::from_secs(2),
        request_timeout: Duration::from_secs(2),
    }
}

pub async fn connect_invoker(handle: &IpcServerHandle) -> WsInvoker {
    WsInvoker::connect(&invoker_options(handle, TEST_AUTH_TOKEN))
        .await
        .expect("Failed to connect invoker")
}

/// A host that accepts one client, authenticates it and hangs up.
///
/// Returns the URL to connect to.
pub async fn start_host_that_closes_after_auth() -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().expect("Listener has no address");

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.expect("Failed to accept");
        let mut ws = accept_async(stream).await.expect("Failed to upgrade");
        let _auth = ws.next().await;
        let ok = ServerFrame::AuthResult {
            success: true,
            error: None,
        };
        let json = serde_json::to_string(&ok).expect("Failed to encode");
        ws.send(Message::Text(json.into()))
            .await
            .expect("Failed to send auth result");
        let _ = ws.close(None).await;
    });

    format!("ws://{addr}")
}

pub async fn connect_to_server(handle: &IpcServerHandle) -> TestSocket {
    let (ws_stream, _) = connect_async(handle.url())
        .await
        .expect("Failed to connect to WebSocket server");
    ws_stream
}

pub async fn send_frame(ws: &mut TestSocket, frame: &ClientFrame) {
    let json = serde_json::to_string(frame).expect("Failed to encode frame");
    send_text(ws, &json).await;
}

pub async fn send_text(ws: &mut TestSocket, text: &str) {
    ws.send(Message::Text(text.to_string().into()))
        .await
        .expect("Failed to send message");
}

pub async fn receive_frame(ws: &mut TestSocket) -> ServerFrame {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(2), ws.next())
            .await
            .expect("Timed out waiting for frame")
            .expect("No message received")
            .expect("Error receiving message");

        if let Message::Text(text) = msg {
            return serde_json::from_str(&text).expect("Failed to decode frame");
        }
    }
}

pub async fn authenticate(ws: &mut TestSocket, token: &str) -> ServerFrame {
    send_frame(
        ws,
        &ClientFrame::Auth {
            token: token.to_string(),
        },
    )
    .await;
    receive_frame(ws).await
}

pub async fn is_connection_closed(ws: &mut TestSocket) -> bool {
    match tokio::time::timeout(Duration::from_millis(500), ws.next()).await {
        Err(_) => false,
        Ok(None) => true,
        Ok(Some(Ok(Message::Close(_)))) => true,
        Ok(Some(Ok(_))) => false,
        Ok(Some(Err(_))) => true,
    }
}
