use crate::error::game_code::GameCodeError;
use crate::game_code::GameCode;

use serde_json::{Value, json};

fn text(raw: &str) -> GameCode {
    GameCode::Text(String::from(raw))
}

#[test]
fn given_six_alphanumerics_when_parsed_then_text_code_trimmed() {
    let code = GameCode::parse("  ABC123\n").unwrap();

    assert_eq!(code, text("ABC123"));
    assert_eq!(code.to_string(), "ABC123");
}

#[test]
fn given_wrong_length_when_parsed_then_invalid() {
    for raw in ["", "ABC12", "ABC1234"] {
        let result = GameCode::parse(raw);
        assert!(
            matches!(result, Err(GameCodeError::Invalid { .. })),
            "'{raw}' should be rejected"
        );
    }
}

#[test]
fn given_punctuation_when_parsed_then_invalid() {
    let result: Result<GameCode, _> = "AB-123".parse();

    match result {
        Err(GameCodeError::Invalid { message, .. }) => {
            assert!(message.contains("ASCII letters and digits"))
        }
        other => panic!("Expected Invalid, got {other:?}"),
    }
}

/// **VALUE**: Configured digits become a numeric code, unless a leading zero marks
/// them as text.
///
/// **BUG THIS CATCHES**: Would catch "012345" losing its leading zero, or "1234567"
/// being rejected for not having six characters.
#[test]
fn given_configured_digits_when_parsed_then_numeric_unless_leading_zero() {
    assert_eq!(GameCode::parse("1234567").unwrap(), GameCode::Numeric(1_234_567));
    assert_eq!(GameCode::parse(" 42 ").unwrap(), GameCode::Numeric(42));
    assert_eq!(GameCode::parse("012345").unwrap(), text("012345"));
    assert!(GameCode::parse("0").is_err());
}

/// **VALUE**: A code read from the host keeps the JSON type it arrived in.
///
/// **BUG THIS CATCHES**: Would catch `1234` becoming the string "001234" and then being
/// sent to a host that only accepts integers.
#[test]
fn given_numeric_host_value_when_read_then_stays_numeric() {
    let code = GameCode::from_value(&json!(1234)).unwrap();

    assert_eq!(code, GameCode::Numeric(1234));
    assert_eq!(Value::from(&code), json!(1234));
    assert_eq!(GameCode::from_value(&json!(1234567)), Some(GameCode::Numeric(1_234_567)));
    assert_eq!(GameCode::from_value(&json!("XYZ789")), Some(text("XYZ789")));
}

/// **BUG THIS CATCHES**: Would catch the host's `0` ("no game") being followed as a game.
#[test]
fn given_unusable_host_values_when_read_then_none() {
    for value in [
        Value::Null,
        json!(0),
        json!(true),
        json!(-5),
        json!(1.5),
        json!("nope"),
        json!("1234"),
        json!({"code": "ABC123"}),
    ] {
        assert_eq!(GameCode::from_value(&value), None, "{value} should not parse");
    }
}

#[test]
fn given_game_code_when_serialized_then_plain_json_of_its_kind() {
    assert_eq!(serde_json::to_value(text("ABC123")).unwrap(), json!("ABC123"));
    assert_eq!(serde_json::to_value(GameCode::Numeric(77)).unwrap(), json!(77));

    let parsed: GameCode = serde_json::from_value(json!("QWE456")).unwrap();
    assert_eq!(parsed, text("QWE456"));
    let parsed: GameCode = serde_json::from_value(json!(9001)).unwrap();
    assert_eq!(parsed, GameCode::Numeric(9001));

    assert!(serde_json::from_value::<GameCode>(json!("bad")).is_err());
    assert!(serde_json::from_value::<GameCode>(json!(0)).is_err());
}
