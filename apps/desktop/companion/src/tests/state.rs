use crate::state::{GameView, SessionState, StateCommand};

use bridge_core::GameCode;

use std::time::Duration;

use serde_json::json;

/// Updates are applied asynchronously by the actor; poll until `check` holds.
async fn wait_for(state: &SessionState, check: impl Fn(&GameView) -> bool) -> GameView {
    for _ in 0..100 {
        let view = state.view().await;
        if check(&view) {
            return view;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("state never reached the expected view: {:?}", state.view().await);
}

fn code(raw: &str) -> GameCode {
    GameCode::parse(raw).unwrap()
}

#[tokio::test]
async fn given_new_state_when_read_then_empty_view() {
    let state = SessionState::new();

    assert_eq!(state.view().await, GameView::default());
}

/// **VALUE**: Snapshots are counted and the latest one is kept.
#[tokio::test]
async fn given_snapshots_when_recorded_then_latest_kept_and_counted() {
    // GIVEN
    let state = SessionState::new();
    state
        .update(StateCommand::SetGameCode(code("ABC123")))
        .await
        .unwrap();

    // WHEN
    state
        .update(StateCommand::RecordSnapshot(json!({"t": 1})))
        .await
        .unwrap();
    state
        .update(StateCommand::RecordSnapshot(json!({"t": 2})))
        .await
        .unwrap();

    // THEN
    let view = wait_for(&state, |v| v.snapshot_count == 2).await;
    assert_eq!(view.game_code, Some(code("ABC123")));
    assert_eq!(view.latest_snapshot, Some(json!({"t": 2})));
}

/// **BUG THIS CATCHES**: Would catch a calculator value from the previous snapshot
/// being shown next to a newer snapshot.
#[tokio::test]
async fn given_calculator_value_when_new_snapshot_arrives_then_value_cleared() {
    let state = SessionState::new();
    state
        .update(StateCommand::RecordSnapshot(json!(1)))
        .await
        .unwrap();
    state
        .update(StateCommand::RecordCalculatorValue(json!(42)))
        .await
        .unwrap();
    wait_for(&state, |v| v.calculator_value == Some(json!(42))).await;

    state
        .update(StateCommand::RecordSnapshot(json!(2)))
        .await
        .unwrap();

    let view = wait_for(&state, |v| v.snapshot_count == 2).await;
    assert_eq!(view.calculator_value, None);
}

#[tokio::test]
async fn given_different_game_code_when_set_then_previous_game_forgotten() {
    let state = SessionState::new();
    state
        .update(StateCommand::SetGameCode(code("ABC123")))
        .await
        .unwrap();
    state
        .update(StateCommand::RecordSnapshot(json!(1)))
        .await
        .unwrap();

    state
        .update(StateCommand::SetGameCode(code("XYZ789")))
        .await
        .unwrap();

    let view = wait_for(&state, |v| v.game_code == Some(code("XYZ789"))).await;
    assert_eq!(view.snapshot_count, 0);
    assert_eq!(view.latest_snapshot, None);
}

#[tokio::test]
async fn given_game_when_cleared_then_view_empty() {
    let state = SessionState::new();
    state
        .update(StateCommand::SetGameCode(code("ABC123")))
        .await
        .unwrap();
    state.update(StateCommand::Clear).await.unwrap();

    let view = wait_for(&state, |v| v.game_code.is_none()).await;
    assert_eq!(view, GameView::default());
}
