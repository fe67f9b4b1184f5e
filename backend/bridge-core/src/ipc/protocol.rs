//! JSON frames exchanged over the command bus.
//!
//! Every frame is one WebSocket text message tagged by `type`. The first
//! client frame must be [`ClientFrame::Auth`]; every later `invoke` is
//! answered by exactly one `resolved` or `rejected` frame carrying the same
//! `request_id`.

use crate::invoke::Args;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `request_id` of a `rejected` frame that answers no invocation: a repeated
/// auth frame or an undecodable one. Clients number requests from 1.
pub const UNSOLICITED_REQUEST_ID: u64 = 0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    Auth {
        token: String,
    },
    Invoke {
        request_id: u64,
        command: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        args: Option<Args>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    AuthResult {
        success: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    Resolved {
        request_id: u64,
        value: Value,
    },
    Rejected {
        request_id: u64,
        code: RejectCode,
        message: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectCode {
    /// No handler is registered for the command.
    UnknownCommand,
    /// The handler ran and failed.
    Rejected,
    /// The frame could not be decoded.
    InvalidMessage,
    AuthError,
}

impl ServerFrame {
    /// Request this frame answers; `None` for auth results.
    pub fn request_id(&self) -> Option<u64> {
        match self {
            ServerFrame::AuthResult { .. } => None,
            ServerFrame::Resolved { request_id, .. } | ServerFrame::Rejected { request_id, .. } => {
                Some(*request_id)
            }
        }
    }
}
