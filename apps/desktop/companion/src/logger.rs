//! Logging for the companion app.
//!
//! Colored stdout plus a plain log file, initialized once per process.

use crate::error::CompanionError;

use common::ErrorLocation;

use std::fs::create_dir_all;
use std::io::stdout;
use std::panic::Location;
use std::path::Path;
use std::sync::Once;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::SystemTime;

use fern::Dispatch;
use fern::colors::Color::{Blue, Green, Magenta, Red, Yellow};
use fern::colors::ColoredLevelConfig;
use humantime::format_rfc3339;
use log::{LevelFilter, info, warn};

static INIT_LOGGER_ONCE: Once = Once::new();

/// Tracks if logger initialization was already attempted.
static LOGGER_ALREADY_CALLED: AtomicBool = AtomicBool::new(false);

const LOG_FILE_NAME: &str = "companion.log";

const LOGGER_INITIALIZED_MESSAGE_PREFIX: &str = "Logger initialized with level: ";

const LOGGER_ALREADY_INITIALIZED_MESSAGE: &str = "Logger already initialized";

#[cfg(debug_assertions)]
const LOG_LEVEL: LevelFilter = LevelFilter::Debug;

#[cfg(not(debug_assertions))]
const LOG_LEVEL: LevelFilter = LevelFilter::Info;

/// Crates of this workspace; they log at [`LOG_LEVEL`].
const WORKSPACE_CRATES: [&str; 4] = ["game_companion", "companion", "bridge_core", "common"];

/// Level for everything else: HTTP, WebSocket and runtime internals.
const DEPENDENCY_LOG_LEVEL: LevelFilter = LevelFilter::Warn;

/// Most verbose level logged for `target`.
pub(crate) fn target_level(target: &str) -> LevelFilter {
    let crate_name = target.split("::").next().unwrap_or(target);
    if WORKSPACE_CRATES.contains(&crate_name) {
        LOG_LEVEL
    } else {
        DEPENDENCY_LOG_LEVEL
    }
}

/// Initialize logging to stdout and `{log_dir}/companion.log`, creating `log_dir`.
///
/// Later calls warn and return `Ok`.
///
/// # Errors
///
/// Returns [`CompanionError::Companion`] if the log file cannot be created
/// or another global logger is already installed.
pub fn initialize(log_dir: &Path) -> Result<(), CompanionError> {
    if LOGGER_ALREADY_CALLED.swap(true, Ordering::SeqCst) {
        warn!("{LOGGER_ALREADY_INITIALIZED_MESSAGE}");
        return Ok(());
    }

    let mut result = Ok(());

    INIT_LOGGER_ONCE.call_once(|| {
        result = initialize_internal(log_dir);
        if result.is_ok() {
            info!("{LOGGER_INITIALIZED_MESSAGE_PREFIX}{LOG_LEVEL:?}");
        }
    });

    result
}

#[track_caller]
fn initialize_internal(log_dir: &Path) -> Result<(), CompanionError> {
    create_dir_all(log_dir).map_err(|e| CompanionError::Companion {
        message: format!("Failed to create log directory {}: {e}", log_dir.display()),
        location: ErrorLocation::from(Location::caller()),
    })?;
    let log_file_path = log_dir.join(LOG_FILE_NAME);

    let color_configuration = ColoredLevelConfig::new()
        .debug(Blue)
        .info(Green)
        .warn(Yellow)
        .error(Red)
        .trace(Magenta);

    let base_dispatch = Dispatch::new()
        .level(LOG_LEVEL)
        .filter(|metadata| metadata.level() <= target_level(metadata.target()));

    let stdout_dispatch = Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "[{date} {level} {target}] {message}",
                date = format_rfc3339(SystemTime::now()),
                level = color_configuration.color(record.level()),
                target = record.target(),
            ))
        })
        .chain(stdout());

    let log_file = fern::log_file(&log_file_path).map_err(|e| CompanionError::Companion {
        message: format!("Failed to create log file {}: {e}", log_file_path.display()),
        location: ErrorLocation::from(Location::caller()),
    })?;

    // Plain text, with source position
    let file_dispatch = Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "[{date} {level} {target}] {message} [{file}:{line}]",
                date = format_rfc3339(SystemTime::now()),
                level = record.level(),
                target = record.target(),
                file = record.file().unwrap_or("unknown"),
                line = record.line().unwrap_or(0),
            ))
        })
        .chain(log_file);

    base_dispatch
        .chain(stdout_dispatch)
        .chain(file_dispatch)
        .apply()
        .map_err(|e| CompanionError::Companion {
            message: format!("Failed to initialize logger: {e}"),
            location: ErrorLocation::from(Location::caller()),
        })?;

    Ok(())
}
