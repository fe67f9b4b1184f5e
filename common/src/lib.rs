//! Shared building blocks for the game-bridge workspace.
//!
//! Everything here is plain data with no I/O:
//!
//! - [`ErrorLocation`]: call-site capture attached to every error variant
//! - [`HttpStatusCode`]: status classification used by the HTTP fallback
//! - [`RedactedToken`]: IPC auth token that never prints its value
//!
//! - **common** (this crate): error plumbing and secrets
//! - **bridge-core**: facade, command bus and clients
//! - **companion**: application wiring everything together

pub mod error;
pub mod http_status;
pub mod redacted_token;

pub use error::error_location::ErrorLocation;
pub use error::redact_error::RedactError;
pub use http_status::HttpStatusCode;
pub use redacted_token::RedactedToken;

#[cfg(test)]
mod tests;
