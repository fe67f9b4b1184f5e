use companion::error::CompanionError;
use companion::logger::initialize as LoggerInitialize;
use companion::session::Session;

use bridge_core::config::{AppConfig, CONFIG_DIR_NAME};
use bridge_core::config::env::{apply_overrides, ipc_token, load_dotenv};
use bridge_core::realtime::WatchEnd;

use common::ErrorLocation;

use std::panic::Location;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use log::{error, info, warn};
use serde_json::Value;

const LOG_DIR_NAME: &str = "logs";
const SNAPSHOT_FILE_NAME: &str = "latest_snapshot.html";

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), CompanionError> {
    let data_dir = data_dir()?;
    LoggerInitialize(&data_dir.join(LOG_DIR_NAME))?;

    info!("Game companion starting");
    info!("Data directory: {}", data_dir.display());

    load_dotenv();
    let config_dir = AppConfig::default_dir()?;
    let mut config = AppConfig::load(&config_dir)?;
    apply_overrides(&mut config);
    config.validate()?;

    let session = Session::connect(&config, ipc_token()).await?;
    if !session.has_host() && !config.backend.fallback_enabled {
        warn!("No host and backend fallback disabled; snapshots will fail");
    }

    session.start_game().await?;
    let game_code = session.resolve_game_code().await?;
    let subscription = session.watch(game_code.clone());
    let summary = session
        .follow(subscription, interrupted(), |snapshot| {
            write_snapshot(&session, snapshot, &data_dir)
        })
        .await?;
    session.end_game().await?;

    let snapshot_count = summary.snapshots;
    match summary.end {
        WatchEnd::TooManyFailures => Err(CompanionError::Companion {
            message: format!(
                "Gave up on game {game_code} after repeated failures ({snapshot_count} snapshot(s) received)"
            ),
            location: ErrorLocation::from(Location::caller()),
        }),
        WatchEnd::Stopped | WatchEnd::ReceiverClosed => {
            info!("Game companion finished with {snapshot_count} snapshot(s)");
            Ok(())
        }
    }
}

/// Resolves on Ctrl-C. Never resolves if the handler cannot be installed.
async fn interrupted() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Interrupted"),
        Err(e) => {
            warn!("Cannot listen for Ctrl-C, run until the watch ends: {e}");
            std::future::pending::<()>().await;
        }
    }
}

#[track_caller]
fn data_dir() -> Result<PathBuf, CompanionError> {
    dirs::data_local_dir()
        .map(|dir| dir.join(CONFIG_DIR_NAME))
        .ok_or_else(|| CompanionError::Companion {
            message: String::from("platform has no local data directory"),
            location: ErrorLocation::from(Location::caller()),
        })
}

/// Best effort; the watch carries on if the file cannot be written.
fn write_snapshot(session: &Session, snapshot: &Value, data_dir: &Path) {
    let path = data_dir.join(SNAPSHOT_FILE_NAME);
    let result = session
        .render_snapshot(snapshot)
        .and_then(|html| {
            std::fs::write(&path, html).map_err(|e| CompanionError::Companion {
                message: format!("Failed to write {}: {e}", path.display()),
                location: ErrorLocation::from(Location::caller()),
            })
        });

    if let Err(e) = result {
        warn!("Snapshot not rendered: {e}");
    }
}
