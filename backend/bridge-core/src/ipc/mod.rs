//! WebSocket command bus between a frontend and its host process.
//!
//! - [`start_ipc_server`]: host side, serves a [`CommandRegistry`](crate::registry::CommandRegistry)
//! - [`WsInvoker`]: frontend side, an [`Invoke`](crate::invoke::Invoke) over the bus
//!
//! # Security
//!
//! - Localhost-only binding (`127.0.0.1`)
//! - Non-loopback connections rejected
//! - Shared auth token required as the first frame
//!
//! # Protocol
//!
//! JSON text frames, see [`protocol`].

pub(crate) mod client;
pub(crate) mod connection_state;
mod handle;
pub mod protocol;
mod server;

pub use client::{WsInvoker, WsInvokerOptions};
pub use handle::IpcServerHandle;
pub use server::start_ipc_server;
