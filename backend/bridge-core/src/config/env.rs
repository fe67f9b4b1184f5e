//! Environment overrides layered on top of `config.json`.
//!
//! A `.env` next to the working directory or the executable is loaded
//! first, so the same variables can live in a file during development.

use super::AppConfig;

use common::RedactedToken;

use std::env;
use std::path::PathBuf;

use log::{info, warn};

pub const IPC_URL_VAR: &str = "GAME_BRIDGE_IPC_URL";
pub const IPC_TOKEN_VAR: &str = "GAME_BRIDGE_IPC_TOKEN";
pub const BACKEND_URL_VAR: &str = "GAME_BRIDGE_BACKEND_URL";
pub const GAME_CODE_VAR: &str = "GAME_BRIDGE_GAME_CODE";

/// Load `.env` from the current directory, then from the executable's directory.
///
/// Returns the file that was loaded, if any.
pub fn load_dotenv() -> Option<PathBuf> {
    if let Ok(path) = dotenvy::dotenv() {
        info!("Loaded .env from: {:?}", path);
        return Some(path);
    }

    let exe_dir = env::current_exe().ok()?.parent()?.to_path_buf();
    let env_path = exe_dir.join(".env");
    if !env_path.exists() {
        return None;
    }

    match dotenvy::from_path(&env_path) {
        Ok(()) => {
            info!("Loaded .env from: {:?}", env_path);
            Some(env_path)
        }
        Err(e) => {
            warn!("Failed to parse .env at {:?}: {}", env_path, e);
            None
        }
    }
}

/// Apply `GAME_BRIDGE_*` variables to `config`.
///
/// Empty values are ignored. Call [`AppConfig::validate`] afterwards.
pub fn apply_overrides(config: &mut AppConfig) {
    if let Some(url) = read_var(IPC_URL_VAR) {
        info!("{IPC_URL_VAR} overrides bridge.ipc_url");
        config.bridge.ipc_url = Some(url);
    }

    if let Some(url) = read_var(BACKEND_URL_VAR) {
        info!("{BACKEND_URL_VAR} overrides backend.base_url");
        config.backend.base_url = url;
    }

    if let Some(code) = read_var(GAME_CODE_VAR) {
        info!("{GAME_CODE_VAR} overrides realtime.game_code");
        config.realtime.game_code = Some(code);
    }
}

/// Command bus token. Never stored in `config.json`.
pub fn ipc_token() -> Option<RedactedToken> {
    read_var(IPC_TOKEN_VAR).map(RedactedToken::new)
}

fn read_var(name: &str) -> Option<String> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Some(value.trim().to_string()),
        Ok(_) => None,
        Err(env::VarError::NotPresent) => None,
        Err(env::VarError::NotUnicode(_)) => {
            warn!("Env var {name} contains invalid unicode, ignoring");
            None
        }
    }
}
