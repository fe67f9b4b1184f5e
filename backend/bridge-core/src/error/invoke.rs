use common::ErrorLocation;

use std::time::Duration;

use thiserror::Error as ThisError;

/// Failures of the invocation primitive.
///
/// The facade never produces these itself; it hands back whatever the
/// primitive settled with.
#[derive(Debug, Clone, ThisError)]
pub enum InvokeError {
    /// The backend ran the command and reported a failure.
    #[error("Rejected Error: {command}: {message} {location}")]
    Rejected {
        command: String,
        message: String,
        location: ErrorLocation,
    },

    #[error("Unknown Command Error: {command} {location}")]
    UnknownCommand {
        command: String,
        location: ErrorLocation,
    },

    /// The bus connection failed before the command settled.
    #[error("Transport Error: {message} {location}")]
    Transport {
        message: String,
        location: ErrorLocation,
    },

    #[error("Timeout Error: {command} did not settle within {timeout:?} {location}")]
    Timeout {
        command: String,
        timeout: Duration,
        location: ErrorLocation,
    },

    #[error("Protocol Error: {message} {location}")]
    Protocol {
        message: String,
        location: ErrorLocation,
    },
}
