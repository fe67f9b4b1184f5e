use crate::RedactedToken;

/// **VALUE**: The bus token never shows up in Debug/Display output.
///
/// **WHY THIS MATTERS**: Connection options are logged at startup. A leaked token lets
/// any local process drive the host's command bus.
#[test]
fn given_token_when_formatted_then_value_is_hidden() {
    let token = RedactedToken::new("super-secret-token");

    assert!(!format!("{token:?}").contains("super-secret"));
    assert!(!format!("{token}").contains("super-secret"));
    assert_eq!(token.expose(), "super-secret-token");
    assert_eq!(token.len(), 18);
}

/// **VALUE**: Serialization refuses instead of writing the secret.
#[test]
fn given_token_when_serialized_then_returns_error() {
    let token = RedactedToken::new("abc");

    let result = serde_json::to_string(&token);

    let message = result.expect_err("Token must not serialize").to_string();
    assert!(message.contains("Refusing to serialize RedactedToken"));
    assert!(!message.contains("abc"));
}

#[test]
fn given_candidates_when_matched_then_only_exact_value_passes() {
    let token = RedactedToken::new("token-1234");

    assert!(token.matches("token-1234"));
    assert!(!token.matches("token-1235"));
    assert!(!token.matches("token-123"));
    assert!(!token.matches(""));
}
