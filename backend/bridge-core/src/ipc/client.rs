//! Frontend side of the command bus: an [`Invoke`] over WebSocket.
//!
//! One writer task drains outgoing frames; one reader task routes each
//! answer to the caller waiting on its `request_id`. Concurrent invocations
//! share the connection.

use crate::error::invoke::InvokeError;
use crate::error::ipc::IpcError;
use crate::invoke::{Args, Invoke};
use crate::ipc::protocol::{ClientFrame, RejectCode, ServerFrame, UNSOLICITED_REQUEST_ID};

use common::{ErrorLocation, RedactedToken};

use std::collections::HashMap;
use std::panic::Location;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use backoff::ExponentialBackoff;
use backoff::backoff::Backoff;
use futures_util::future::BoxFuture;
use futures_util::{FutureExt, SinkExt, StreamExt};
use log::{debug, error, info, trace, warn};
use serde_json::Value;
use tokio::spawn as TokioSpawn;
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::time::{sleep as TokioSleep, timeout as TokioTimeout};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use url::Url;

type Waiters = HashMap<u64, oneshot::Sender<Result<Value, InvokeError>>>;

/// Waiters by `request_id`; `None` once the connection has closed.
pub(crate) type Pending = Arc<Mutex<Option<Waiters>>>;

/// What the reader did with one frame from the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AnswerRoute {
    Delivered,
    /// A rejection answering no request; the host saw a protocol misuse
    Unsolicited,
    /// No caller waits for this `request_id` (timed out or never sent)
    Unmatched,
    Undecodable,
}

/// Connection settings for [`WsInvoker`].
#[derive(Debug, Clone)]
pub struct WsInvokerOptions {
    pub url: String,
    pub token: RedactedToken,
    /// Bound on connecting plus authenticating, across retries.
    pub connect_timeout: Duration,
    /// Bound on each invocation, from send to answer.
    pub request_timeout: Duration,
}

pub struct WsInvoker {
    outgoing: mpsc::UnboundedSender<Message>,
    pending: Pending,
    next_request_id: AtomicU64,
    request_timeout: Duration,
}

impl WsInvoker {
    /// Connect and authenticate once.
    ///
    /// # Errors
    ///
    /// * [`IpcError::UrlParse`] - `url` is not a valid URL
    /// * [`IpcError::Handshake`] - connection or WebSocket upgrade failed
    /// * [`IpcError::Auth`] - the host rejected the token or never answered
    pub async fn connect(options: &WsInvokerOptions) -> Result<Self, IpcError> {
        let url = Url::parse(&options.url)?;

        let (ws_stream, _) = connect_async(url.as_str())
            .await
            .map_err(|e| IpcError::Handshake {
                message: format!("Failed to connect to {url}: {e}"),
                location: ErrorLocation::from(Location::caller()),
            })?;

        let (mut write, mut read) = ws_stream.split();

        let auth = serde_json::to_string(&ClientFrame::Auth {
            token: options.token.expose().to_string(),
        })?;
        write
            .send(Message::Text(auth.into()))
            .await
            .map_err(|e| IpcError::Send {
                message: format!("Failed to send auth frame: {e}"),
                location: ErrorLocation::from(Location::caller()),
            })?;

        let first = TokioTimeout(options.connect_timeout, read.next())
            .await
            .map_err(|_| IpcError::Auth {
                message: format!("No auth answer within {:?}", options.connect_timeout),
                location: ErrorLocation::from(Location::caller()),
            })?;

        match first {
            Some(Ok(Message::Text(text))) => match serde_json::from_str::<ServerFrame>(&text)? {
                ServerFrame::AuthResult { success: true, .. } => {
                    info!("Authenticated with command bus at {url}");
                }
                ServerFrame::AuthResult { error, .. } => {
                    return Err(IpcError::Auth {
                        message: error.unwrap_or_else(|| String::from("Authentication refused")),
                        location: ErrorLocation::from(Location::caller()),
                    });
                }
                other => {
                    return Err(IpcError::Auth {
                        message: format!("Expected auth_result, got {other:?}"),
                        location: ErrorLocation::from(Location::caller()),
                    });
                }
            },
            Some(Ok(_)) | None => {
                return Err(IpcError::Auth {
                    message: String::from("Connection closed during authentication"),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
            Some(Err(e)) => {
                return Err(IpcError::Read {
                    message: format!("Error reading auth answer: {e}"),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
        }

        let pending: Pending = Arc::new(Mutex::new(Some(HashMap::new())));
        let (outgoing, mut outgoing_rx) = mpsc::unbounded_channel::<Message>();

        TokioSpawn(async move {
            while let Some(message) = outgoing_rx.recv().await {
                if let Err(e) = write.send(message).await {
                    error!("Command bus write failed: {e}");
                    break;
                }
            }
            let _ = write.close().await;
        });

        let reader_pending = Arc::clone(&pending);
        TokioSpawn(async move {
            while let Some(message) = read.next().await {
                match message {
                    Ok(Message::Text(text)) => {
                        route_answer(&reader_pending, &text).await;
                    }
                    Ok(Message::Close(_)) => break,
                    Ok(_) => trace!("Ignoring non-text frame from command bus"),
                    Err(e) => {
                        warn!("Command bus read failed: {e}");
                        break;
                    }
                }
            }
            close_pending(&reader_pending).await;
        });

        Ok(Self {
            outgoing,
            pending,
            next_request_id: AtomicU64::new(1),
            request_timeout: options.request_timeout,
        })
    }

    /// Connect with exponential backoff until `connect_timeout` elapses.
    ///
    /// An auth rejection is final and is not retried.
    pub async fn connect_with_retry(options: &WsInvokerOptions) -> Result<Self, IpcError> {
        let mut backoff = ExponentialBackoff {
            max_elapsed_time: Some(options.connect_timeout),
            ..Default::default()
        };

        loop {
            match Self::connect(options).await {
                Ok(invoker) => return Ok(invoker),
                Err(e @ IpcError::Auth { .. }) => return Err(e),
                Err(e) => match backoff.next_backoff() {
                    Some(duration) => {
                        debug!("Command bus not ready ({e}), retrying after {duration:?}");
                        TokioSleep(duration).await;
                    }
                    None => return Err(e),
                },
            }
        }
    }

    /// Number of invocations still waiting for an answer.
    pub async fn pending_count(&self) -> usize {
        self.pending.lock().await.as_ref().map_or(0, HashMap::len)
    }

    /// Whether the host has closed the connection.
    pub async fn is_closed(&self) -> bool {
        self.pending.lock().await.is_none()
    }

    async fn call(&self, command: &str, args: Option<Args>) -> Result<Value, InvokeError> {
        let request_id = self.next_request_id.fetch_add(1, Ordering::Relaxed);
        let frame = ClientFrame::Invoke {
            request_id,
            command: command.to_string(),
            args,
        };
        let json = serde_json::to_string(&frame).map_err(|e| InvokeError::Protocol {
            message: format!("Failed to encode {command}: {e}"),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let (tx, rx) = oneshot::channel();
        {
            let mut pending = self.pending.lock().await;
            let Some(waiters) = pending.as_mut() else {
                return Err(closed_error(command));
            };
            waiters.insert(request_id, tx);
        }

        if self.outgoing.send(Message::Text(json.into())).is_err() {
            if let Some(waiters) = self.pending.lock().await.as_mut() {
                waiters.remove(&request_id);
            }
            return Err(closed_error(command));
        }

        trace!("Sent {command} as request {request_id}");

        match TokioTimeout(self.request_timeout, rx).await {
            Ok(Ok(result)) => result.map_err(|e| with_command(e, command)),
            Ok(Err(_)) => Err(InvokeError::Transport {
                message: format!("Connection dropped before {command} settled"),
                location: ErrorLocation::from(Location::caller()),
            }),
            Err(_) => {
                if let Some(waiters) = self.pending.lock().await.as_mut() {
                    waiters.remove(&request_id);
                }
                Err(InvokeError::Timeout {
                    command: command.to_string(),
                    timeout: self.request_timeout,
                    location: ErrorLocation::from(Location::caller()),
                })
            }
        }
    }
}

impl Invoke for WsInvoker {
    fn invoke<'a>(
        &'a self,
        command: &'a str,
        args: Option<Args>,
    ) -> BoxFuture<'a, Result<Value, InvokeError>> {
        self.call(command, args).boxed()
    }
}

pub(crate) async fn route_answer(pending: &Pending, text: &str) -> AnswerRoute {
    let frame = match serde_json::from_str::<ServerFrame>(text) {
        Ok(frame) => frame,
        Err(e) => {
            warn!("Undecodable frame from command bus: {e}");
            return AnswerRoute::Undecodable;
        }
    };

    let request_id = match &frame {
        ServerFrame::Rejected {
            request_id,
            code,
            message,
        } if *request_id == UNSOLICITED_REQUEST_ID => {
            warn!("Command bus rejected a frame we sent ({code:?}): {message}");
            return AnswerRoute::Unsolicited;
        }
        ServerFrame::AuthResult { .. } => {
            warn!("Unexpected auth_result after authentication");
            return AnswerRoute::Unsolicited;
        }
        ServerFrame::Resolved { request_id, .. } | ServerFrame::Rejected { request_id, .. } => {
            *request_id
        }
    };

    let waiter = pending
        .lock()
        .await
        .as_mut()
        .and_then(|waiters| waiters.remove(&request_id));
    let Some(waiter) = waiter else {
        debug!("Answer for unknown or expired request {request_id}");
        return AnswerRoute::Unmatched;
    };

    let result = match frame {
        ServerFrame::Resolved { value, .. } => Ok(value),
        ServerFrame::Rejected { code, message, .. } => Err(rejection(code, message)),
        ServerFrame::AuthResult { .. } => return AnswerRoute::Unsolicited,
    };

    // The caller may have timed out and dropped its receiver.
    let _ = waiter.send(result);
    AnswerRoute::Delivered
}

/// Fail every waiter and refuse later calls.
pub(crate) async fn close_pending(pending: &Pending) {
    let mut pending = pending.lock().await;
    if let Some(waiters) = pending.take() {
        if !waiters.is_empty() {
            warn!(
                "Command bus closed with {} request(s) in flight",
                waiters.len()
            );
        }
    }
}

#[track_caller]
fn closed_error(command: &str) -> InvokeError {
    InvokeError::Transport {
        message: format!("Command bus connection is closed, {command} not sent"),
        location: ErrorLocation::from(Location::caller()),
    }
}

#[track_caller]
fn rejection(code: RejectCode, message: String) -> InvokeError {
    let location = ErrorLocation::from(Location::caller());
    match code {
        RejectCode::UnknownCommand => InvokeError::UnknownCommand {
            command: String::new(),
            location,
        },
        RejectCode::Rejected => InvokeError::Rejected {
            command: String::new(),
            message,
            location,
        },
        RejectCode::InvalidMessage | RejectCode::AuthError => {
            InvokeError::Protocol { message, location }
        }
    }
}

/// Fill in the command name, which the answer frame does not repeat.
fn with_command(error: InvokeError, command: &str) -> InvokeError {
    match error {
        InvokeError::UnknownCommand { location, .. } => InvokeError::UnknownCommand {
            command: command.to_string(),
            location,
        },
        InvokeError::Rejected {
            message, location, ..
        } => InvokeError::Rejected {
            command: command.to_string(),
            message,
            location,
        },
        other => other,
    }
}
