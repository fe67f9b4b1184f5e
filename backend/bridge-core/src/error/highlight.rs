use common::ErrorLocation;

use std::panic::Location;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum HighlightError {
    #[error("Unknown Language Error: no grammar for '{language}' {location}")]
    UnknownLanguage {
        language: String,
        location: ErrorLocation,
    },

    #[error("Unknown Theme Error: '{theme}' {location}")]
    UnknownTheme {
        theme: String,
        location: ErrorLocation,
    },

    #[error("Render Error: {message} {location}")]
    Render {
        message: String,
        location: ErrorLocation,
    },
}

impl From<syntect::Error> for HighlightError {
    #[track_caller]
    fn from(error: syntect::Error) -> Self {
        HighlightError::Render {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
