use crate::error::backend::BackendError;
use crate::error::invoke::InvokeError;

use common::ErrorLocation;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum RealtimeError {
    #[error(transparent)]
    Invoke(#[from] InvokeError),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("Empty Payload Error: {message} {location}")]
    EmptyPayload {
        message: String,
        location: ErrorLocation,
    },

    #[error("Decode Error: {message} {location}")]
    Decode {
        message: String,
        location: ErrorLocation,
    },

    /// Neither the bridge nor the HTTP fallback can serve the request.
    #[error("Unavailable Error: {message} {location}")]
    Unavailable {
        message: String,
        location: ErrorLocation,
    },
}
