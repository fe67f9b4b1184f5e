use common::ErrorLocation;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum GameCodeError {
    #[error("Invalid Game Code Error: {message} {location}")]
    Invalid {
        message: String,
        location: ErrorLocation,
    },
}
