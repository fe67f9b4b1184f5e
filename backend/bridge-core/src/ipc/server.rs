//! Host side of the command bus.
//!
//! The server:
//!
//! - Listens on localhost only
//! - Requires an auth frame with the shared token before anything else
//! - Dispatches `invoke` frames into a [`CommandRegistry`]
//! - Answers each invoke with one `resolved` or `rejected` frame
//!
//! Frames on one connection are handled in arrival order.

use crate::error::invoke::InvokeError;
use crate::error::ipc::IpcError;
use crate::ipc::connection_state::ConnectionState;
use crate::ipc::handle::IpcServerHandle;
use crate::ipc::protocol::{ClientFrame, RejectCode, ServerFrame, UNSOLICITED_REQUEST_ID};
use crate::registry::CommandRegistry;

use common::{ErrorLocation, RedactedToken};

use std::net::SocketAddr;
use std::panic::Location;
use std::sync::Arc;

use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use tokio::net::{TcpListener, TcpStream};
use tokio::spawn as TokioSpawn;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{WebSocketStream, accept_async};
use uuid::Uuid;

type WsWrite = SplitSink<WebSocketStream<TcpStream>, Message>;

/// Start serving `registry` on `127.0.0.1:<ipc_port>`.
///
/// Port `0` binds an ephemeral port; read it back from
/// [`IpcServerHandle::local_addr`]. A token is generated when none is given.
///
/// # Errors
///
/// Returns [`IpcError::Io`] if the port cannot be bound.
pub async fn start_ipc_server(
    ipc_port: u16,
    auth_token: Option<RedactedToken>,
    registry: CommandRegistry,
) -> Result<IpcServerHandle, IpcError> {
    let auth_token = auth_token.unwrap_or_else(|| {
        info!("Generated IPC auth token");
        RedactedToken::new(Uuid::new_v4().to_string())
    });

    let listener = TcpListener::bind(("127.0.0.1", ipc_port)).await?;
    let local_addr = listener.local_addr()?;

    info!(
        "IPC server listening on {} serving {:?}",
        local_addr,
        registry.commands()
    );

    let registry = Arc::new(registry);
    let token = auth_token.clone();

    let accept_task = TokioSpawn(async move {
        while let Ok((stream, addr)) = listener.accept().await {
            debug!("Client connecting from {}", addr);
            let token_clone = token.clone();
            let registry_clone = Arc::clone(&registry);
            TokioSpawn(async move {
                if let Err(e) = handle_connection(stream, addr, token_clone, registry_clone).await
                {
                    error!("Connection {} ended with error: {}", addr, e);
                }
            });
        }
    });

    Ok(IpcServerHandle {
        local_addr,
        auth_token,
        accept_task,
    })
}

/// Serve a single WebSocket connection until the peer disconnects.
///
/// # Protocol
///
/// 1. Non-loopback peers are dropped without a response
/// 2. The first frame MUST be `auth`; a wrong token gets a failed
///    `auth_result` and the connection closes
/// 3. Subsequent `invoke` frames are dispatched; undecodable frames are
///    answered with `rejected` / `invalid_message` and skipped
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    auth_token: RedactedToken,
    registry: Arc<CommandRegistry>,
) -> Result<(), IpcError> {
    if !addr.ip().is_loopback() {
        warn!("Rejected non-loopback connection from {}", addr);
        return Ok(());
    }

    let ws_stream = accept_async(stream).await.map_err(|e| IpcError::Handshake {
        message: format!("WebSocket handshake failed: {e}"),
        location: ErrorLocation::from(Location::caller()),
    })?;

    let (mut write, mut read) = ws_stream.split();
    let mut state = ConnectionState::new(auth_token);

    match read.next().await {
        Some(Ok(Message::Text(text))) => match serde_json::from_str::<ClientFrame>(&text) {
            Ok(ClientFrame::Auth { token }) => {
                if state.validate_token(&token) {
                    info!("Client {} authenticated", addr);
                    send_frame(
                        &mut write,
                        &ServerFrame::AuthResult {
                            success: true,
                            error: None,
                        },
                    )
                    .await?;
                } else {
                    warn!("Client {} auth failed: invalid token", addr);
                    send_frame(
                        &mut write,
                        &ServerFrame::AuthResult {
                            success: false,
                            error: Some(String::from("Invalid authentication token")),
                        },
                    )
                    .await?;
                    return Ok(());
                }
            }
            Ok(_) | Err(_) => {
                warn!("Client {} auth failed: first frame was not auth", addr);
                return Ok(());
            }
        },
        Some(Ok(_)) => {
            warn!("Client {} sent non-text first message", addr);
            return Ok(());
        }
        Some(Err(e)) => {
            return Err(IpcError::Read {
                message: format!("Error reading first message: {e}"),
                location: ErrorLocation::from(Location::caller()),
            });
        }
        None => {
            debug!("Client {} disconnected before sending auth", addr);
            return Ok(());
        }
    }

    while let Some(msg) = read.next().await {
        if !state.is_authenticated() {
            break;
        }

        let text = match msg {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => break,
            Ok(Message::Ping(_) | Message::Pong(_)) => continue,
            Ok(_) => {
                warn!("Client {} sent non-text message after auth", addr);
                continue;
            }
            Err(e) => {
                return Err(IpcError::Read {
                    message: format!("Error reading message: {e}"),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
        };

        let response = match serde_json::from_str::<ClientFrame>(&text) {
            Ok(ClientFrame::Invoke {
                request_id,
                command,
                args,
            }) => dispatch(&registry, request_id, &command, args).await,
            Ok(ClientFrame::Auth { .. }) => ServerFrame::Rejected {
                request_id: UNSOLICITED_REQUEST_ID,
                code: RejectCode::AuthError,
                message: String::from("Auth handshake already completed"),
            },
            Err(e) => {
                warn!("Undecodable frame from {}: {}", addr, e);
                ServerFrame::Rejected {
                    request_id: UNSOLICITED_REQUEST_ID,
                    code: RejectCode::InvalidMessage,
                    message: format!("Invalid frame: {e}"),
                }
            }
        };

        send_frame(&mut write, &response).await?;
    }

    info!("Client {} disconnected", addr);
    Ok(())
}

async fn dispatch(
    registry: &CommandRegistry,
    request_id: u64,
    command: &str,
    args: Option<crate::invoke::Args>,
) -> ServerFrame {
    debug!("Handling {command} (request {request_id})");

    match registry.dispatch(command, args).await {
        Ok(value) => ServerFrame::Resolved { request_id, value },
        Err(InvokeError::UnknownCommand { command, .. }) => ServerFrame::Rejected {
            request_id,
            code: RejectCode::UnknownCommand,
            message: format!("Unknown command: {command}"),
        },
        Err(InvokeError::Rejected { message, .. }) => ServerFrame::Rejected {
            request_id,
            code: RejectCode::Rejected,
            message,
        },
        Err(other) => ServerFrame::Rejected {
            request_id,
            code: RejectCode::Rejected,
            message: other.to_string(),
        },
    }
}

async fn send_frame(write: &mut WsWrite, frame: &ServerFrame) -> Result<(), IpcError> {
    let json = serde_json::to_string(frame)?;

    write
        .send(Message::Text(json.into()))
        .await
        .map_err(|e| IpcError::Send {
            message: format!("Failed to send frame: {e}"),
            location: ErrorLocation::from(Location::caller()),
        })
}
