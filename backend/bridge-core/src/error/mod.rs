pub mod backend;
pub mod config;
pub mod game_code;
pub mod highlight;
pub mod invoke;
pub mod ipc;
pub mod realtime;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Invoke(#[from] invoke::InvokeError),

    #[error(transparent)]
    Ipc(#[from] ipc::IpcError),

    #[error(transparent)]
    Highlight(#[from] highlight::HighlightError),

    #[error(transparent)]
    Backend(#[from] backend::BackendError),

    #[error(transparent)]
    Realtime(#[from] realtime::RealtimeError),

    #[error(transparent)]
    GameCode(#[from] game_code::GameCodeError),

    #[error(transparent)]
    Config(#[from] config::ConfigError),
}
