use crate::ErrorLocation;

use thiserror::Error as ThisError;

/// A secret was about to leave its wrapper through a generic path.
#[derive(Debug, ThisError)]
pub enum RedactError {
    #[error("Refusing to serialize {secret}; call expose() explicitly {location}")]
    SerializeRefused {
        secret: &'static str,
        location: ErrorLocation,
    },
}
