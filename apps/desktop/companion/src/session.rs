//! One companion run: bridge, game code, snapshots.

use crate::error::CompanionError;
use crate::state::{GameView, SessionState, StateCommand};

use bridge_core::backend_client::BackendClient;
use bridge_core::config::AppConfig;
use bridge_core::config::env::IPC_TOKEN_VAR;
use bridge_core::error::invoke::InvokeError;
use bridge_core::highlight::Highlighter;
use bridge_core::ipc::{WsInvoker, WsInvokerOptions};
use bridge_core::payload::unwrap_json_string;
use bridge_core::realtime::{RealtimeSettings, RealtimeSubscription, RealtimeWatcher, WatchEnd};
use bridge_core::{Bridge, CommandFacade, GameCode};

use common::{ErrorLocation, RedactedToken};

use std::future::Future;
use std::panic::Location;

use log::{debug, info, warn};
use serde_json::Value;

const SNAPSHOT_LANGUAGE: &str = "json";

/// How a [`Session::follow`] run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchSummary {
    pub end: WatchEnd,
    /// Snapshots handled before the end, counted as they arrived
    pub snapshots: u64,
}

pub struct Session {
    facade: CommandFacade,
    watcher: RealtimeWatcher,
    highlighter: Highlighter,
    configured_code: Option<String>,
    state: SessionState,
}

impl Session {
    /// Connect to the host command bus when one is configured.
    ///
    /// A bus that cannot be reached is not an error: the session runs with
    /// an absent bridge and relies on the backend fallback.
    pub async fn connect(
        config: &AppConfig,
        token: Option<RedactedToken>,
    ) -> Result<Self, CompanionError> {
        let bridge = match (&config.bridge.ipc_url, token) {
            (Some(url), Some(token)) => {
                let options = WsInvokerOptions {
                    url: url.clone(),
                    token,
                    connect_timeout: config.bridge.connect_timeout(),
                    request_timeout: config.bridge.request_timeout(),
                };
                match WsInvoker::connect_with_retry(&options).await {
                    Ok(invoker) => Bridge::new(invoker),
                    Err(e) => {
                        warn!("Command bus at {url} unavailable, running without a host: {e}");
                        Bridge::absent()
                    }
                }
            }
            (Some(url), None) => {
                warn!("{IPC_TOKEN_VAR} is not set, not connecting to {url}");
                Bridge::absent()
            }
            (None, _) => {
                info!("No command bus configured, running without a host");
                Bridge::absent()
            }
        };

        Self::with_bridge(config, bridge)
    }

    /// Build a session over an existing bridge.
    pub fn with_bridge(config: &AppConfig, bridge: Bridge) -> Result<Self, CompanionError> {
        let facade = CommandFacade::new(bridge);

        let fallback = if config.backend.fallback_enabled {
            Some(BackendClient::with_timeout(
                &config.backend.base_url,
                config.backend.timeout(),
            )?)
        } else {
            None
        };

        let watcher = RealtimeWatcher::new(
            facade.clone(),
            fallback,
            RealtimeSettings::from(&config.realtime),
        );

        Ok(Self {
            facade,
            watcher,
            highlighter: Highlighter::new(config.highlight.style, config.highlight.theme.clone()),
            configured_code: config.realtime.game_code.clone(),
            state: SessionState::new(),
        })
    }

    pub fn facade(&self) -> &CommandFacade {
        &self.facade
    }

    pub fn has_host(&self) -> bool {
        self.facade.bridge().is_available()
    }

    pub async fn view(&self) -> GameView {
        self.state.view().await
    }

    /// Ask the host to start the game. A no-op without a host.
    pub async fn start_game(&self) -> Result<(), CompanionError> {
        if let Some(result) = self.facade.start_game().await? {
            debug!("start_game answered {result}");
        }
        Ok(())
    }

    /// Find the code of the game to follow.
    ///
    /// Tries, in order: the host's current code, a code the host generates
    /// through `send_code`, then the configured code. A host failure moves
    /// on to the next source.
    ///
    /// # Errors
    ///
    /// * [`CompanionError::Core`] - the configured code is malformed
    /// * [`CompanionError::NoGameCode`] - no source produced a code
    pub async fn resolve_game_code(&self) -> Result<GameCode, CompanionError> {
        let code = match code_from("get_game_code", self.facade.get_game_code().await) {
            Some(code) => Some(code),
            None => code_from("send_code", self.facade.send_code().await),
        };

        let code = match (code, &self.configured_code) {
            (Some(code), _) => code,
            (None, Some(raw)) => {
                info!("Using configured game code");
                GameCode::parse(raw)?
            }
            (None, None) => {
                return Err(CompanionError::NoGameCode {
                    message: String::from("host gave no game code and none is configured"),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
        };

        self.state
            .update(StateCommand::SetGameCode(code.clone()))
            .await?;
        Ok(code)
    }

    /// Calculator value for `game_state`; `None` without a host.
    pub async fn calculate(&self, game_state: &Value) -> Result<Option<Value>, CompanionError> {
        let value = self
            .facade
            .get_calculator_value(game_state.clone())
            .await?
            .map(unwrap_json_string);

        if let Some(value) = &value {
            self.state
                .update(StateCommand::RecordCalculatorValue(value.clone()))
                .await?;
        }
        Ok(value)
    }

    /// Start polling snapshots of `game_code`.
    pub fn watch(&self, game_code: GameCode) -> RealtimeSubscription {
        self.watcher.clone().watch(game_code)
    }

    /// Handle snapshots from `subscription` until the watch ends or
    /// `shutdown` resolves.
    ///
    /// `on_snapshot` sees each snapshot before it is recorded. One `shutdown`
    /// future serves the whole run, so a request made while a snapshot is
    /// handled ends the watch before the next snapshot is taken.
    pub async fn follow<S, F>(
        &self,
        mut subscription: RealtimeSubscription,
        shutdown: S,
        mut on_snapshot: F,
    ) -> Result<WatchSummary, CompanionError>
    where
        S: Future<Output = ()>,
        F: FnMut(&Value),
    {
        tokio::pin!(shutdown);
        let mut snapshots: u64 = 0;

        loop {
            tokio::select! {
                biased;

                _ = &mut shutdown => {
                    info!("Shutdown requested, stopping watch");
                    subscription.stop();
                    break;
                }
                snapshot = subscription.next() => {
                    let Some(snapshot) = snapshot else { break };
                    snapshots += 1;
                    on_snapshot(&snapshot);
                    self.record_snapshot(snapshot).await?;
                }
            }
        }

        let end = subscription.finish().await;
        Ok(WatchSummary { end, snapshots })
    }

    /// Store a snapshot from [`Session::watch`] and compute its calculator value.
    ///
    /// Calculator failures are logged; the snapshot is kept either way.
    pub async fn record_snapshot(&self, snapshot: Value) -> Result<(), CompanionError> {
        self.state
            .update(StateCommand::RecordSnapshot(snapshot.clone()))
            .await?;

        match self.calculate(&snapshot).await {
            Ok(Some(value)) => info!("Calculator value: {value}"),
            Ok(None) => {}
            Err(e) => warn!("Calculator value unavailable: {e}"),
        }
        Ok(())
    }

    /// Pretty-printed `snapshot` as highlighted markup.
    pub fn render_snapshot(&self, snapshot: &Value) -> Result<String, CompanionError> {
        let pretty = serde_json::to_string_pretty(snapshot).map_err(|e| {
            CompanionError::Companion {
                message: format!("Failed to format snapshot: {e}"),
                location: ErrorLocation::from(Location::caller()),
            }
        })?;
        Ok(self.highlighter.highlight(&pretty, SNAPSHOT_LANGUAGE)?)
    }

    pub async fn end_game(&self) -> Result<(), CompanionError> {
        self.state.update(StateCommand::Clear).await
    }
}

fn code_from(command: &str, result: Result<Option<Value>, InvokeError>) -> Option<GameCode> {
    match result {
        Ok(Some(value)) => {
            let value = unwrap_json_string(value);
            let code = GameCode::from_value(&value);
            if code.is_none() {
                warn!("{command} returned no usable game code: {value}");
            }
            code
        }
        Ok(None) => None,
        Err(e) => {
            warn!("{command} failed: {e}");
            None
        }
    }
}
