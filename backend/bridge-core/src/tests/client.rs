use crate::error::invoke::InvokeError;
use crate::ipc::client::{AnswerRoute, Pending, close_pending, route_answer};
use crate::ipc::protocol::{RejectCode, ServerFrame, UNSOLICITED_REQUEST_ID};

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Value, json};
use tokio::sync::{Mutex, oneshot};

fn open_pending() -> Pending {
    Arc::new(Mutex::new(Some(HashMap::new())))
}

fn encode(frame: &ServerFrame) -> String {
    serde_json::to_string(frame).unwrap()
}

async fn wait_for(
    pending: &Pending,
    request_id: u64,
) -> oneshot::Receiver<Result<Value, InvokeError>> {
    let (tx, rx) = oneshot::channel();
    pending
        .lock()
        .await
        .as_mut()
        .unwrap()
        .insert(request_id, tx);
    rx
}

#[tokio::test]
async fn given_waiter_when_resolved_frame_routed_then_value_delivered() {
    let pending = open_pending();
    let rx = wait_for(&pending, 7).await;

    let route = route_answer(
        &pending,
        &encode(&ServerFrame::Resolved {
            request_id: 7,
            value: json!("ABC123"),
        }),
    )
    .await;

    assert_eq!(route, AnswerRoute::Delivered);
    assert_eq!(rx.await.unwrap().unwrap(), json!("ABC123"));
}

/// **VALUE**: A rejection of a frame that answered no request is reported, and no
/// waiter is disturbed by it.
///
/// **BUG THIS CATCHES**: Would catch a repeated auth frame or a garbled frame being
/// dropped without a trace, hiding a client that misuses the protocol.
#[tokio::test]
async fn given_unsolicited_rejection_when_routed_then_reported_and_waiters_kept() {
    // GIVEN: One caller waiting on request 1
    let pending = open_pending();
    let _rx = wait_for(&pending, 1).await;

    // WHEN
    let route = route_answer(
        &pending,
        &encode(&ServerFrame::Rejected {
            request_id: UNSOLICITED_REQUEST_ID,
            code: RejectCode::AuthError,
            message: String::from("Auth handshake already completed"),
        }),
    )
    .await;

    // THEN
    assert_eq!(route, AnswerRoute::Unsolicited);
    assert_eq!(pending.lock().await.as_ref().map(HashMap::len), Some(1));
}

#[tokio::test]
async fn given_late_or_garbled_frames_when_routed_then_not_delivered() {
    let pending = open_pending();

    let late = route_answer(
        &pending,
        &encode(&ServerFrame::Resolved {
            request_id: 99,
            value: Value::Null,
        }),
    )
    .await;
    let garbled = route_answer(&pending, "{ not a frame").await;
    let auth = route_answer(
        &pending,
        &encode(&ServerFrame::AuthResult {
            success: true,
            error: None,
        }),
    )
    .await;

    assert_eq!(late, AnswerRoute::Unmatched);
    assert_eq!(garbled, AnswerRoute::Undecodable);
    assert_eq!(auth, AnswerRoute::Unsolicited);
}

/// **BUG THIS CATCHES**: Would catch in-flight callers hanging after the connection
/// closes, or a closed table still accepting new waiters.
#[tokio::test]
async fn given_waiters_when_closed_then_dropped_and_table_marked_closed() {
    let pending = open_pending();
    let rx = wait_for(&pending, 3).await;

    close_pending(&pending).await;

    assert!(rx.await.is_err());
    assert!(pending.lock().await.is_none());
    let route = route_answer(
        &pending,
        &encode(&ServerFrame::Resolved {
            request_id: 3,
            value: Value::Null,
        }),
    )
    .await;
    assert_eq!(route, AnswerRoute::Unmatched);
}
