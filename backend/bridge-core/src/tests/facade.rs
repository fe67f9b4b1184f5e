// Unit tests for the command facade pass-through contract

use crate::error::invoke::InvokeError;
use crate::facade::CommandFacade;
use crate::facade::commands::{
    ALL_COMMANDS, GET_CALCULATOR_VALUE, GET_GAME_CODE, GET_REALTIME_GAME, SEND_CODE, START_GAME,
};
use crate::invoke::{Args, Bridge};
use crate::tests::support::RecordingInvoker;

use common::ErrorLocation;

use std::panic::Location;
use std::sync::Arc;

use serde_json::{Value, json};

fn facade_with(reply: Result<Value, InvokeError>) -> (CommandFacade, Arc<RecordingInvoker>) {
    let invoker = Arc::new(RecordingInvoker::replying(reply));
    let facade = CommandFacade::new(Bridge::new(Arc::clone(&invoker)));
    (facade, invoker)
}

fn args(key: &str, value: Value) -> Option<Args> {
    let mut map = Args::new();
    map.insert(key.to_string(), value);
    Some(map)
}

/// **VALUE**: Every parameterless facade method forwards its own command name, once,
/// with no payload, and hands back exactly what the primitive resolved to.
///
/// **BUG THIS CATCHES**: Would catch a copy-paste slip where two methods share a
/// command string, or a method that wraps/reshapes the host's result.
#[tokio::test]
async fn given_bridge_present_when_parameterless_methods_called_then_forward_once_unchanged() {
    let reply = json!({"opaque": [1, 2, 3]});

    for (expected_command, method) in [
        (SEND_CODE, 0),
        (START_GAME, 1),
        (GET_GAME_CODE, 2),
    ] {
        // GIVEN: A facade over a recording primitive
        let (facade, invoker) = facade_with(Ok(reply.clone()));

        // WHEN: Calling the method
        let result = match method {
            0 => facade.send_code().await,
            1 => facade.start_game().await,
            _ => facade.get_game_code().await,
        };

        // THEN: One call, right name, no payload, result unchanged
        assert_eq!(result.unwrap(), Some(reply.clone()));
        assert_eq!(invoker.calls(), vec![(expected_command.to_string(), None)]);
    }
}

/// **VALUE**: `get_realtime_game("ABC123")` sends `{gameCode: "ABC123"}`.
#[tokio::test]
async fn given_game_code_when_get_realtime_game_called_then_payload_has_game_code() {
    // GIVEN
    let (facade, invoker) = facade_with(Ok(Value::String(String::from("{\"t\":1}"))));

    // WHEN
    let result = facade.get_realtime_game("ABC123").await.unwrap();

    // THEN
    assert_eq!(result, Some(Value::String(String::from("{\"t\":1}"))));
    assert_eq!(
        invoker.calls(),
        vec![(
            GET_REALTIME_GAME.to_string(),
            args("gameCode", json!("ABC123"))
        )]
    );
}

/// **VALUE**: `get_calculator_value(state)` sends `{gameState: state}` without touching it.
#[tokio::test]
async fn given_game_state_when_get_calculator_value_called_then_state_passed_through() {
    // GIVEN: An arbitrary nested state
    let state = json!({"active_player": {"level": 18}, "enemy_players": []});
    let (facade, invoker) = facade_with(Ok(json!(42.5)));

    // WHEN
    let result = facade.get_calculator_value(state.clone()).await.unwrap();

    // THEN
    assert_eq!(result, Some(json!(42.5)));
    assert_eq!(
        invoker.calls(),
        vec![(GET_CALCULATOR_VALUE.to_string(), args("gameState", state))]
    );
}

/// **VALUE**: Without a host, every method resolves to `Ok(None)`.
///
/// **WHY THIS MATTERS**: The frontend runs outside the host during development and in
/// the browser build. Calls must become no-ops there, not errors.
#[tokio::test]
async fn given_bridge_absent_when_any_method_called_then_resolves_none() {
    // GIVEN
    let facade = CommandFacade::new(Bridge::absent());

    // WHEN / THEN
    assert_eq!(facade.send_code().await.unwrap(), None);
    assert_eq!(facade.start_game().await.unwrap(), None);
    assert_eq!(facade.get_game_code().await.unwrap(), None);
    assert_eq!(facade.get_realtime_game("ABC123").await.unwrap(), None);
    assert_eq!(facade.get_calculator_value(json!({})).await.unwrap(), None);
    assert!(!facade.bridge().is_available());
}

/// **VALUE**: Primitive failures reach the caller unchanged.
///
/// **BUG THIS CATCHES**: Would catch a facade that swallows rejections into `Ok(None)`,
/// making a failing host indistinguishable from an absent one.
#[tokio::test]
async fn given_primitive_rejects_when_method_called_then_error_propagates() {
    // GIVEN
    let (facade, invoker) = facade_with(Err(InvokeError::Rejected {
        command: START_GAME.to_string(),
        message: String::from("game already running"),
        location: ErrorLocation::from(Location::caller()),
    }));

    // WHEN
    let result = facade.start_game().await;

    // THEN
    match result {
        Err(InvokeError::Rejected { message, .. }) => {
            assert_eq!(message, "game already running")
        }
        other => panic!("Expected Rejected, got {other:?}"),
    }
    assert_eq!(invoker.calls().len(), 1);
}

#[test]
fn given_default_facade_when_created_then_bridge_is_absent() {
    assert!(!CommandFacade::default().bridge().is_available());
}

#[test]
fn given_command_table_when_inspected_then_names_are_distinct_snake_case() {
    let mut names = ALL_COMMANDS.to_vec();
    names.sort_unstable();
    names.dedup();

    assert_eq!(names.len(), ALL_COMMANDS.len());
    assert!(
        ALL_COMMANDS
            .iter()
            .all(|name| name.chars().all(|c| c.is_ascii_lowercase() || c == '_'))
    );
}
