pub mod backend_client;
pub mod config;
pub mod error;
pub mod facade;
pub mod game_code;
pub mod highlight;
pub mod invoke;
pub mod ipc;
pub mod payload;
pub mod realtime;
pub mod registry;

#[cfg(test)]
mod tests;

pub use facade::CommandFacade;
pub use game_code::GameCode;
pub use highlight::{Highlighter, highlight_code};
pub use invoke::{Args, Bridge, Invoke};
pub use registry::CommandRegistry;
