//! In-process command routing.
//!
//! [`CommandRegistry`] maps command names to async handlers supplied by the
//! host. It implements [`Invoke`] directly, so a facade can talk to it
//! in-process, and the IPC server dispatches bus frames into it.

use crate::error::invoke::InvokeError;
use crate::invoke::{Args, Invoke};

use common::ErrorLocation;

use std::collections::HashMap;
use std::future::Future;
use std::panic::Location;
use std::sync::Arc;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use log::{debug, warn};
use serde_json::Value;

type Handler = Arc<dyn Fn(Option<Args>) -> BoxFuture<'static, Result<Value, String>> + Send + Sync>;

#[derive(Clone, Default)]
pub struct CommandRegistry {
    handlers: HashMap<String, Handler>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` under `command`, replacing any previous one.
    ///
    /// A handler returning `Err(message)` rejects the call with
    /// [`InvokeError::Rejected`].
    pub fn register<F, Fut>(&mut self, command: impl Into<String>, handler: F) -> &mut Self
    where
        F: Fn(Option<Args>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, String>> + Send + 'static,
    {
        let command = command.into();
        let handler: Handler = Arc::new(move |args| handler(args).boxed());

        if self.handlers.insert(command.clone(), handler).is_some() {
            warn!("Replaced handler for command {command}");
        }
        self
    }

    pub fn contains(&self, command: &str) -> bool {
        self.handlers.contains_key(command)
    }

    /// Registered command names, sorted.
    pub fn commands(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Run the handler for `command`.
    #[track_caller]
    pub fn dispatch(
        &self,
        command: &str,
        args: Option<Args>,
    ) -> BoxFuture<'static, Result<Value, InvokeError>> {
        let location = ErrorLocation::from(Location::caller());
        let command = command.to_string();

        let Some(handler) = self.handlers.get(&command).cloned() else {
            warn!("No handler registered for {command}");
            return async move {
                Err(InvokeError::UnknownCommand { command, location })
            }
            .boxed();
        };

        async move {
            debug!("Dispatching {command}");
            handler(args)
                .await
                .map_err(|message| InvokeError::Rejected {
                    command,
                    message,
                    location,
                })
        }
        .boxed()
    }
}

impl Invoke for CommandRegistry {
    fn invoke<'a>(
        &'a self,
        command: &'a str,
        args: Option<Args>,
    ) -> BoxFuture<'a, Result<Value, InvokeError>> {
        self.dispatch(command, args)
    }
}
