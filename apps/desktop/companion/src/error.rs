use bridge_core::error::CoreError;
use bridge_core::error::backend::BackendError;
use bridge_core::error::config::ConfigError;
use bridge_core::error::game_code::GameCodeError;
use bridge_core::error::highlight::HighlightError;
use bridge_core::error::invoke::InvokeError;

use common::ErrorLocation;

use std::panic::Location;

use serde::Serialize;
use thiserror::Error;

/// Errors surfaced by the companion app.
///
/// Core errors are flattened to their message so the whole enum stays
/// serializable for status output, with the conversion site as location.
#[derive(Debug, Error, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum CompanionError {
    /// Error from this App
    #[error("Companion Error: {message} {location}")]
    Companion {
        message: String,
        location: ErrorLocation,
    },

    /// Error from bridge-core (bus, backend, config, highlighting)
    #[error("Core Error: {message} {location}")]
    Core {
        message: String,
        location: ErrorLocation,
    },

    /// Neither the host nor the configuration provided a game code
    #[error("No Game Code Error: {message} {location}")]
    NoGameCode {
        message: String,
        location: ErrorLocation,
    },
}

impl From<CoreError> for CompanionError {
    #[track_caller]
    fn from(error: CoreError) -> Self {
        CompanionError::Core {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<BackendError> for CompanionError {
    #[track_caller]
    fn from(error: BackendError) -> Self {
        CompanionError::from(CoreError::from(error))
    }
}

impl From<ConfigError> for CompanionError {
    #[track_caller]
    fn from(error: ConfigError) -> Self {
        CompanionError::from(CoreError::from(error))
    }
}

impl From<GameCodeError> for CompanionError {
    #[track_caller]
    fn from(error: GameCodeError) -> Self {
        CompanionError::from(CoreError::from(error))
    }
}

impl From<HighlightError> for CompanionError {
    #[track_caller]
    fn from(error: HighlightError) -> Self {
        CompanionError::from(CoreError::from(error))
    }
}

impl From<InvokeError> for CompanionError {
    #[track_caller]
    fn from(error: InvokeError) -> Self {
        CompanionError::from(CoreError::from(error))
    }
}
