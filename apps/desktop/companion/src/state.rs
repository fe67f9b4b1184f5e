use crate::error::CompanionError;

use bridge_core::GameCode;

use common::ErrorLocation;

use std::panic::Location;
use std::sync::Arc;

use log::{debug, info, warn};
use serde_json::Value;
use tokio::sync::{Mutex, RwLock, mpsc};

const COMMAND_CHANNEL_CAPACITY: usize = 100;

/// Mutations of the session state.
#[derive(Debug, Clone)]
pub enum StateCommand {
    /// The game code the session is following
    SetGameCode(GameCode),

    /// A snapshot arrived from the watcher
    RecordSnapshot(Value),

    /// A calculator value arrived for the latest snapshot
    RecordCalculatorValue(Value),

    /// Forget the game (after the watch ended)
    Clear,
}

/// What the session knows about the game it follows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GameView {
    pub game_code: Option<GameCode>,
    pub latest_snapshot: Option<Value>,
    pub calculator_value: Option<Value>,
    pub snapshot_count: u64,
}

/// Session state behind an actor.
///
/// Mutations are sent as [`StateCommand`]s and applied in order by one
/// task; reads go straight to the shared view.
#[derive(Clone)]
pub struct SessionState {
    command_tx: Arc<Mutex<Option<mpsc::Sender<StateCommand>>>>,
    view: Arc<RwLock<GameView>>,
}

impl SessionState {
    /// The actor is spawned on first update.
    pub fn new() -> Self {
        Self {
            command_tx: Arc::new(Mutex::new(None)),
            view: Arc::new(RwLock::new(GameView::default())),
        }
    }

    /// Queue a mutation.
    ///
    /// Resolves once the command is queued, not once it is applied.
    pub async fn update(&self, cmd: StateCommand) -> Result<(), CompanionError> {
        let mut tx_guard = self.command_tx.lock().await;

        let tx = tx_guard.get_or_insert_with(|| {
            let (tx, rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
            tokio::spawn(state_actor(rx, Arc::clone(&self.view)));
            info!("Session state actor spawned");
            tx
        });

        tx.send(cmd).await.map_err(|e| CompanionError::Companion {
            message: format!("Session state actor died: {e}"),
            location: ErrorLocation::from(Location::caller()),
        })
    }

    pub async fn view(&self) -> GameView {
        self.view.read().await.clone()
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

async fn state_actor(mut command_rx: mpsc::Receiver<StateCommand>, view: Arc<RwLock<GameView>>) {
    debug!("Session state actor started");

    while let Some(cmd) = command_rx.recv().await {
        let mut view_write = view.write().await;

        match cmd {
            StateCommand::SetGameCode(code) => {
                match view_write.game_code.clone() {
                    Some(existing) if existing != code => {
                        warn!("Switching from game {existing} to game {code}");
                        *view_write = GameView::default();
                    }
                    Some(_) => {}
                    None => info!("Following game {code}"),
                }
                view_write.game_code = Some(code);
            }
            StateCommand::RecordSnapshot(snapshot) => {
                view_write.snapshot_count += 1;
                view_write.latest_snapshot = Some(snapshot);
                view_write.calculator_value = None;
            }
            StateCommand::RecordCalculatorValue(value) => {
                view_write.calculator_value = Some(value);
            }
            StateCommand::Clear => {
                if let Some(code) = &view_write.game_code {
                    info!(
                        "Clearing game {code} after {} snapshot(s)",
                        view_write.snapshot_count
                    );
                }
                *view_write = GameView::default();
            }
        }
    }

    debug!("Session state actor stopped");
}
