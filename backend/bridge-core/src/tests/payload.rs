use crate::payload::{decode, unwrap_json_string};

use serde::Deserialize;
use serde_json::{Value, json};

#[derive(Debug, Deserialize, PartialEq)]
struct Snapshot {
    game_time: f64,
}

/// **VALUE**: Callers decode a result the same way whether the host sent JSON text or a
/// structured value.
#[test]
fn given_string_or_structured_result_when_decoded_then_same_value() {
    let from_text: Snapshot = decode(json!("{\"game_time\": 12.5}")).unwrap();
    let from_value: Snapshot = decode(json!({"game_time": 12.5})).unwrap();

    assert_eq!(from_text, Snapshot { game_time: 12.5 });
    assert_eq!(from_text, from_value);
}

#[test]
fn given_non_json_text_when_decoded_then_error() {
    assert!(decode::<Snapshot>(json!("not json")).is_err());
}

#[test]
fn given_values_when_unwrapped_then_one_level_of_string_encoding_removed() {
    assert_eq!(unwrap_json_string(json!("[1,2]")), json!([1, 2]));
    assert_eq!(unwrap_json_string(json!("\"ABC123\"")), json!("ABC123"));
    assert_eq!(unwrap_json_string(json!("ABC123")), json!("ABC123"));
    assert_eq!(unwrap_json_string(json!({"a": 1})), json!({"a": 1}));
    assert_eq!(unwrap_json_string(Value::Null), Value::Null);
}
