// Test doubles shared by unit tests.

use crate::error::invoke::InvokeError;
use crate::invoke::{Args, Invoke};

use std::sync::Mutex;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use serde_json::Value;

/// Invocation primitive that records every call and answers with a fixed reply.
pub(crate) struct RecordingInvoker {
    calls: Mutex<Vec<(String, Option<Args>)>>,
    reply: Result<Value, InvokeError>,
}

impl RecordingInvoker {
    pub(crate) fn replying(reply: Result<Value, InvokeError>) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            reply,
        }
    }

    pub(crate) fn calls(&self) -> Vec<(String, Option<Args>)> {
        self.calls.lock().unwrap().clone()
    }
}

impl Invoke for RecordingInvoker {
    fn invoke<'a>(
        &'a self,
        command: &'a str,
        args: Option<Args>,
    ) -> BoxFuture<'a, Result<Value, InvokeError>> {
        self.calls.lock().unwrap().push((command.to_string(), args));
        let reply = self.reply.clone();
        async move { reply }.boxed()
    }
}
