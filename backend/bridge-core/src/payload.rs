//! Decoding of opaque command results.
//!
//! Hosts commonly return JSON already serialized into a string. Callers
//! that know the shape they expect use [`decode`]; everything else keeps
//! the raw [`Value`].

use serde::de::DeserializeOwned;
use serde_json::Value;

/// Turn a result into `T`, parsing it first when it arrived as a JSON string.
pub fn decode<T: DeserializeOwned>(value: Value) -> Result<T, serde_json::Error> {
    match value {
        Value::String(text) => serde_json::from_str(&text),
        other => serde_json::from_value(other),
    }
}

/// Unwrap one level of string encoding, leaving structured values untouched.
///
/// A string that is not valid JSON is kept as a plain string.
pub fn unwrap_json_string(value: Value) -> Value {
    match value {
        Value::String(text) => serde_json::from_str(&text).unwrap_or(Value::String(text)),
        other => other,
    }
}
