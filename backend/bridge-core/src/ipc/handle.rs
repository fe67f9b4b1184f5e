//! Handle to a running command bus server.

use common::RedactedToken;

use std::net::SocketAddr;

use log::info;
use tokio::task::JoinHandle;

/// Returned by [`start_ipc_server`](crate::ipc::start_ipc_server).
///
/// Dropping the handle leaves the server running until the process exits;
/// call [`shutdown`](IpcServerHandle::shutdown) to stop accepting connections.
pub struct IpcServerHandle {
    pub(crate) local_addr: SocketAddr,
    pub(crate) auth_token: RedactedToken,
    pub(crate) accept_task: JoinHandle<()>,
}

impl IpcServerHandle {
    /// Address the server actually bound (useful with port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// `ws://` URL clients connect to.
    pub fn url(&self) -> String {
        format!("ws://{}", self.local_addr)
    }

    pub fn auth_token(&self) -> &RedactedToken {
        &self.auth_token
    }

    /// Stop accepting new connections. Open connections finish on their own.
    pub fn shutdown(self) {
        self.accept_task.abort();
        info!("IPC server on {} shut down", self.local_addr);
    }
}
