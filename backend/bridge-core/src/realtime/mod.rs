//! Polling of live game snapshots.
//!
//! Snapshots come from the host through the facade. Without a host, the
//! watcher asks the HTTP backend directly when a [`BackendClient`] is
//! configured. Snapshot contents are opaque JSON.

use crate::backend_client::BackendClient;
use crate::error::realtime::RealtimeError;
use crate::facade::CommandFacade;
use crate::game_code::GameCode;

use common::ErrorLocation;

use std::panic::Location;
use std::time::Duration;

use log::{debug, info, warn};
use serde_json::Value;
use tokio::spawn as TokioSpawn;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};

const SNAPSHOT_CHANNEL_CAPACITY: usize = 16;

#[derive(Debug, Clone)]
pub struct RealtimeSettings {
    pub poll_interval: Duration,
    /// Consecutive failures after which polling stops.
    pub max_failures: u32,
    /// Items the backend simulates in fallback snapshots.
    pub simulated_items: Vec<u32>,
}

impl Default for RealtimeSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            max_failures: 10,
            simulated_items: vec![crate::config::DEFAULT_SIMULATED_ITEM],
        }
    }
}

impl From<&crate::config::RealtimeConfig> for RealtimeSettings {
    fn from(config: &crate::config::RealtimeConfig) -> Self {
        Self {
            poll_interval: config.poll_interval(),
            max_failures: config.max_failures,
            simulated_items: config.simulated_items.clone(),
        }
    }
}

/// Why a watch ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchEnd {
    Stopped,
    /// The snapshot receiver was dropped.
    ReceiverClosed,
    TooManyFailures,
}

#[derive(Clone)]
pub struct RealtimeWatcher {
    facade: CommandFacade,
    fallback: Option<BackendClient>,
    settings: RealtimeSettings,
}

impl RealtimeWatcher {
    pub fn new(
        facade: CommandFacade,
        fallback: Option<BackendClient>,
        settings: RealtimeSettings,
    ) -> Self {
        Self {
            facade,
            fallback,
            settings,
        }
    }

    pub fn settings(&self) -> &RealtimeSettings {
        &self.settings
    }

    /// Fetch one snapshot.
    ///
    /// A string result is decoded as JSON; any other value is returned as is.
    ///
    /// # Errors
    ///
    /// * [`RealtimeError::Invoke`] - the host call failed
    /// * [`RealtimeError::EmptyPayload`] - the host answered with an empty string
    /// * [`RealtimeError::Decode`] - the host string was not JSON
    /// * [`RealtimeError::Backend`] - the HTTP fallback failed
    /// * [`RealtimeError::Unavailable`] - no host and no fallback
    pub async fn fetch_once(&self, game_code: &GameCode) -> Result<Value, RealtimeError> {
        match self.facade.get_realtime_game(game_code).await? {
            Some(Value::String(text)) if text.is_empty() => Err(RealtimeError::EmptyPayload {
                message: format!("Host returned an empty snapshot for {game_code}"),
                location: ErrorLocation::from(Location::caller()),
            }),
            Some(Value::String(text)) => {
                serde_json::from_str(&text).map_err(|e| RealtimeError::Decode {
                    message: format!("Snapshot for {game_code} is not JSON: {e}"),
                    location: ErrorLocation::from(Location::caller()),
                })
            }
            Some(value) => Ok(value),
            None => self.fetch_from_backend(game_code).await,
        }
    }

    async fn fetch_from_backend(&self, game_code: &GameCode) -> Result<Value, RealtimeError> {
        let Some(client) = &self.fallback else {
            return Err(RealtimeError::Unavailable {
                message: String::from("No host bridge and no backend fallback configured"),
                location: ErrorLocation::from(Location::caller()),
            });
        };

        debug!("No host bridge, asking backend for {game_code}");
        Ok(client
            .get_by_code(game_code, &self.settings.simulated_items)
            .await?)
    }

    /// Poll `game_code` in the background.
    ///
    /// Snapshots arrive on [`RealtimeSubscription::next`]. Polling stops on
    /// [`RealtimeSubscription::stop`], when the subscription is dropped, or
    /// after `max_failures` consecutive failures.
    pub fn watch(self, game_code: GameCode) -> RealtimeSubscription {
        let (snapshot_tx, snapshot_rx) = mpsc::channel(SNAPSHOT_CHANNEL_CAPACITY);
        let (stop_tx, stop_rx) = watch::channel(false);

        let task = TokioSpawn(self.poll_loop(game_code, snapshot_tx, stop_rx));

        RealtimeSubscription {
            snapshots: snapshot_rx,
            stop: stop_tx,
            task,
        }
    }

    async fn poll_loop(
        self,
        game_code: GameCode,
        snapshots: mpsc::Sender<Value>,
        mut stop: watch::Receiver<bool>,
    ) -> WatchEnd {
        let mut ticker = interval(self.settings.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut failures: u32 = 0;

        info!(
            "Watching game {game_code} every {:?}",
            self.settings.poll_interval
        );

        loop {
            tokio::select! {
                biased;
                changed = stop.changed() => {
                    if changed.is_err() || *stop.borrow() {
                        info!("Stopped watching game {game_code}");
                        return WatchEnd::Stopped;
                    }
                    continue;
                }
                _ = ticker.tick() => {}
            }

            match self.fetch_once(&game_code).await {
                Ok(snapshot) => {
                    failures = 0;
                    if snapshots.send(snapshot).await.is_err() {
                        if *stop.borrow() {
                            return WatchEnd::Stopped;
                        }
                        debug!("Snapshot receiver for {game_code} dropped");
                        return WatchEnd::ReceiverClosed;
                    }
                }
                Err(e) => {
                    failures += 1;
                    warn!(
                        "Snapshot for {game_code} failed ({failures}/{}): {e}",
                        self.settings.max_failures
                    );
                    if failures >= self.settings.max_failures {
                        warn!("Stopping watch of {game_code} after {failures} failures");
                        return WatchEnd::TooManyFailures;
                    }
                }
            }
        }
    }
}

/// Live handle on a [`RealtimeWatcher::watch`] task.
pub struct RealtimeSubscription {
    snapshots: mpsc::Receiver<Value>,
    stop: watch::Sender<bool>,
    task: JoinHandle<WatchEnd>,
}

impl RealtimeSubscription {
    /// Next snapshot; `None` once polling has ended.
    pub async fn next(&mut self) -> Option<Value> {
        self.snapshots.recv().await
    }

    pub fn stop(&self) {
        let _ = self.stop.send(true);
    }

    /// Wait for the polling task and report why it ended.
    pub async fn finish(self) -> WatchEnd {
        let Self {
            snapshots,
            stop,
            task,
        } = self;
        let _ = stop.send(true);
        drop(snapshots);
        task.await.unwrap_or(WatchEnd::Stopped)
    }
}
