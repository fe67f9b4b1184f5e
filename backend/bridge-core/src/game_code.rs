//! Code identifying a game on the host and the backend.
//!
//! Hosts hand out either numeric codes or six-character text codes. The
//! code keeps the shape it arrived in so it travels back as the same JSON
//! type.

use crate::error::game_code::GameCodeError;

use common::ErrorLocation;

use std::fmt;
use std::panic::Location;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const GAME_CODE_LEN: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub enum GameCode {
    /// Non-zero integer code; sent as a JSON number
    Numeric(u64),

    /// Six ASCII letters and digits; sent as a JSON string
    Text(String),
}

impl GameCode {
    /// Zero is the host's "no game" answer and is rejected.
    #[track_caller]
    pub fn numeric(code: u64) -> Result<Self, GameCodeError> {
        if code == 0 {
            return Err(GameCodeError::Invalid {
                message: String::from("0 is not a game code"),
                location: ErrorLocation::from(Location::caller()),
            });
        }
        Ok(Self::Numeric(code))
    }

    #[track_caller]
    pub fn text(raw: &str) -> Result<Self, GameCodeError> {
        let trimmed = raw.trim();

        if trimmed.len() != GAME_CODE_LEN {
            return Err(GameCodeError::Invalid {
                message: format!(
                    "expected {GAME_CODE_LEN} characters, got {} in '{trimmed}'",
                    trimmed.len()
                ),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        if !trimmed.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(GameCodeError::Invalid {
                message: format!("'{trimmed}' must be ASCII letters and digits"),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        Ok(Self::Text(trimmed.to_string()))
    }

    /// Parse a code typed by a user or read from configuration.
    ///
    /// Digits without a leading zero form a numeric code; anything else must
    /// be a text code.
    #[track_caller]
    pub fn parse(raw: &str) -> Result<Self, GameCodeError> {
        let trimmed = raw.trim();
        let is_number = !trimmed.is_empty()
            && !trimmed.starts_with('0')
            && trimmed.chars().all(|c| c.is_ascii_digit());

        match trimmed.parse::<u64>() {
            Ok(code) if is_number => Self::numeric(code),
            _ => Self::text(trimmed),
        }
    }

    /// Read a code out of an opaque host result, keeping its JSON type.
    ///
    /// Anything that is not a valid string or non-zero integer yields `None`.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Self::text(s).ok(),
            Value::Number(n) => n.as_u64().and_then(|code| Self::numeric(code).ok()),
            _ => None,
        }
    }
}

impl FromStr for GameCode {
    type Err = GameCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<Value> for GameCode {
    type Error = GameCodeError;

    #[track_caller]
    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match &value {
            Value::String(s) => Self::text(s),
            Value::Number(n) => match n.as_u64() {
                Some(code) => Self::numeric(code),
                None => Err(GameCodeError::Invalid {
                    message: format!("{n} is not a non-negative integer"),
                    location: ErrorLocation::from(Location::caller()),
                }),
            },
            other => Err(GameCodeError::Invalid {
                message: format!("expected a string or number, got {other}"),
                location: ErrorLocation::from(Location::caller()),
            }),
        }
    }
}

impl From<&GameCode> for Value {
    fn from(code: &GameCode) -> Self {
        match code {
            GameCode::Numeric(n) => Value::from(*n),
            GameCode::Text(s) => Value::String(s.clone()),
        }
    }
}

impl From<GameCode> for Value {
    fn from(code: GameCode) -> Self {
        match code {
            GameCode::Numeric(n) => Value::from(n),
            GameCode::Text(s) => Value::String(s),
        }
    }
}

impl fmt::Display for GameCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}
