use common::ErrorLocation;

use std::path::PathBuf;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("Config Read Error: {path}: {source} {location}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
        location: ErrorLocation,
    },

    #[error("Config Parse Error: {path}: {reason} {location}")]
    Parse {
        path: PathBuf,
        reason: String,
        location: ErrorLocation,
    },

    #[error("Config Write Error: {path}: {source} {location}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
        location: ErrorLocation,
    },

    #[error("Config Serialization Error: {reason} {location}")]
    Serialize {
        reason: String,
        location: ErrorLocation,
    },

    #[error("Config Validation Error: {reason} {location}")]
    Validation {
        reason: String,
        location: ErrorLocation,
    },

    /// The platform reports no per-user config directory.
    #[error("Config Directory Error: {reason} {location}")]
    DirectoryUnavailable {
        reason: String,
        location: ErrorLocation,
    },
}
