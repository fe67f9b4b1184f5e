// Unit tests for error module
// Errors are serialized into status output, so their shape matters

use crate::error::CompanionError;

use bridge_core::GameCode;
use bridge_core::error::invoke::InvokeError;

use common::ErrorLocation;

use std::panic::Location;

/// **VALUE**: Tests that errors can be serialized with their variant and message.
///
/// **BUG THIS CATCHES**: Would catch if someone removes the `#[derive(Serialize)]`
/// or adds a non-serializable field to a variant.
#[test]
fn given_companion_error_when_serialized_then_tagged_with_variant_and_data() {
    // GIVEN: A CompanionError
    let err = CompanionError::NoGameCode {
        message: String::from("Test"),
        location: ErrorLocation::from(Location::caller()),
    };

    // WHEN: Serializing to JSON
    let json = serde_json::to_value(&err).expect("Error should be serializable");

    // THEN: Variant name and message are present
    assert_eq!(json["type"], "NoGameCode");
    assert_eq!(json["data"]["message"], "Test");
    assert!(json["data"]["location"]["line"].is_u64());
}

/// **VALUE**: Core failures keep their own text when converted.
///
/// **BUG THIS CATCHES**: Would catch a conversion that replaces the core message
/// with a generic one, hiding which command failed.
#[test]
fn given_core_errors_when_converted_then_core_variant_keeps_message() {
    let invoke = InvokeError::UnknownCommand {
        command: String::from("buy_item"),
        location: ErrorLocation::from(Location::caller()),
    };
    let parse = GameCode::parse("nope").unwrap_err();

    let from_invoke = CompanionError::from(invoke);
    let from_parse = CompanionError::from(parse);

    match from_invoke {
        CompanionError::Core { message, .. } => assert!(message.contains("buy_item")),
        other => panic!("Expected Core, got {other:?}"),
    }
    match from_parse {
        CompanionError::Core { message, .. } => assert!(message.contains("Invalid Game Code")),
        other => panic!("Expected Core, got {other:?}"),
    }
}

#[test]
fn given_error_when_displayed_then_kind_message_and_location() {
    let err = CompanionError::Companion {
        message: String::from("boom"),
        location: ErrorLocation::from(Location::caller()),
    };

    let text = err.to_string();

    assert!(text.starts_with("Companion Error: boom ["));
    assert!(text.contains("error.rs:"));
}
