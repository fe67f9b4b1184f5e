//! The invocation primitive and the bridge that may or may not carry one.
//!
//! A frontend reaches host commands through a single capability:
//! `invoke(command, args) -> result`. [`Invoke`] models that capability so
//! it can be swapped for an in-process [`CommandRegistry`](crate::registry::CommandRegistry),
//! the WebSocket bus client [`WsInvoker`](crate::ipc::WsInvoker), or a test double.
//!
//! [`Bridge`] makes "not running inside the host" explicit: an absent bridge
//! resolves every call to `Ok(None)` without touching anything.

use crate::error::invoke::InvokeError;

use std::fmt;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use log::debug;
use serde_json::{Map, Value};

/// Named parameters of a command, passed through unexamined.
pub type Args = Map<String, Value>;

/// Capability to invoke a named backend command.
pub trait Invoke: Send + Sync {
    fn invoke<'a>(
        &'a self,
        command: &'a str,
        args: Option<Args>,
    ) -> BoxFuture<'a, Result<Value, InvokeError>>;
}

impl<T: Invoke + ?Sized> Invoke for Arc<T> {
    fn invoke<'a>(
        &'a self,
        command: &'a str,
        args: Option<Args>,
    ) -> BoxFuture<'a, Result<Value, InvokeError>> {
        (**self).invoke(command, args)
    }
}

/// Optional invocation primitive.
#[derive(Clone, Default)]
pub struct Bridge {
    invoker: Option<Arc<dyn Invoke>>,
}

impl Bridge {
    pub fn new<I: Invoke + 'static>(invoker: I) -> Self {
        Self {
            invoker: Some(Arc::new(invoker)),
        }
    }

    pub fn from_arc(invoker: Arc<dyn Invoke>) -> Self {
        Self {
            invoker: Some(invoker),
        }
    }

    /// A bridge with no host behind it.
    pub fn absent() -> Self {
        Self { invoker: None }
    }

    pub fn is_available(&self) -> bool {
        self.invoker.is_some()
    }

    /// Forward one call to the primitive.
    ///
    /// # Returns
    ///
    /// * `Ok(None)` - No primitive; nothing was invoked
    /// * `Ok(Some(value))` - The primitive's result, unmodified
    /// * `Err(InvokeError)` - The primitive's failure, unmodified
    pub async fn call(
        &self,
        command: &str,
        args: Option<Args>,
    ) -> Result<Option<Value>, InvokeError> {
        let Some(invoker) = &self.invoker else {
            debug!("Bridge absent, skipping {command}");
            return Ok(None);
        };

        invoker.invoke(command, args).await.map(Some)
    }
}

impl fmt::Debug for Bridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bridge")
            .field("available", &self.is_available())
            .finish()
    }
}
