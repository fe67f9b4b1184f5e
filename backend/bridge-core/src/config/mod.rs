pub mod env;

use crate::error::config::ConfigError;
use crate::highlight::{DEFAULT_THEME, HighlightStyle};

use common::ErrorLocation;

use std::panic::Location;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{info, warn};
use serde::{Deserialize, Serialize};

pub const CONFIG_DIR_NAME: &str = "game-bridge";
const CONFIG_FILE_NAME: &str = "config.json";
const CONFIG_VERSION: u32 = 1;

pub const DEFAULT_BACKEND_HOST: &str = "localhost";
pub const DEFAULT_BACKEND_PORT: u16 = 8082;
pub const DEFAULT_BACKEND_URL: &str =
    const_format::concatcp!("http://", DEFAULT_BACKEND_HOST, ":", DEFAULT_BACKEND_PORT);

/// Item simulated by the backend when building realtime snapshots.
pub const DEFAULT_SIMULATED_ITEM: u32 = 3115;

// ============================================
// CONFIG STRUCTS
// ============================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// `ws://127.0.0.1:<port>` of the host command bus; `None` runs without a bridge.
    #[serde(default)]
    pub ipc_url: Option<String>,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            ipc_url: None,
            connect_timeout_ms: default_connect_timeout_ms(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_backend_url")]
    pub base_url: String,
    #[serde(default = "default_backend_timeout_secs")]
    pub timeout_secs: u64,
    /// Query the backend directly when no bridge is available.
    #[serde(default = "default_true")]
    pub fallback_enabled: bool,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_backend_url(),
            timeout_secs: default_backend_timeout_secs(),
            fallback_enabled: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealtimeConfig {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_max_failures")]
    pub max_failures: u32,
    #[serde(default = "default_simulated_items")]
    pub simulated_items: Vec<u32>,
    /// Used when the host cannot provide a code.
    #[serde(default)]
    pub game_code: Option<String>,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            max_failures: default_max_failures(),
            simulated_items: default_simulated_items(),
            game_code: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighlightConfig {
    #[serde(default)]
    pub style: HighlightStyle,
    #[serde(default = "default_theme")]
    pub theme: String,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            style: HighlightStyle::default(),
            theme: default_theme(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub bridge: BridgeConfig,

    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub realtime: RealtimeConfig,

    #[serde(default)]
    pub highlight: HighlightConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            bridge: BridgeConfig::default(),
            backend: BackendConfig::default(),
            realtime: RealtimeConfig::default(),
            highlight: HighlightConfig::default(),
        }
    }
}

// ============================================
// DEFAULT FUNCTIONS
// ============================================

fn default_version() -> u32 {
    CONFIG_VERSION
}
fn default_true() -> bool {
    true
}
fn default_connect_timeout_ms() -> u64 {
    5_000
}
fn default_request_timeout_ms() -> u64 {
    10_000
}
fn default_backend_url() -> String {
    DEFAULT_BACKEND_URL.to_string()
}
fn default_backend_timeout_secs() -> u64 {
    10
}
fn default_poll_interval_ms() -> u64 {
    1_000
}
fn default_max_failures() -> u32 {
    10
}
fn default_simulated_items() -> Vec<u32> {
    vec![DEFAULT_SIMULATED_ITEM]
}
fn default_theme() -> String {
    DEFAULT_THEME.to_string()
}

// ============================================
// IMPLEMENTATION
// ============================================

impl BridgeConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl BackendConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl RealtimeConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl AppConfig {
    /// Per-user directory holding `config.json`.
    #[track_caller]
    pub fn default_dir() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|dir| dir.join(CONFIG_DIR_NAME))
            .ok_or_else(|| ConfigError::DirectoryUnavailable {
                reason: String::from("platform has no config directory"),
                location: ErrorLocation::from(Location::caller()),
            })
    }

    /// Load config from {config_dir}/config.json.
    ///
    /// A missing file yields defaults. A file that exists but cannot be read,
    /// parsed or validated is an error.
    pub fn load(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            info!(
                "Config file not found at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path).map_err(|e| {
            warn!("Failed to read config file: {}", e);
            ConfigError::Read {
                path: config_path.clone(),
                source: e,
                location: ErrorLocation::from(Location::caller()),
            }
        })?;

        let config: AppConfig = serde_json::from_str(&contents).map_err(|e| {
            warn!("Failed to parse config JSON: {}", e);
            ConfigError::Parse {
                path: config_path.clone(),
                reason: e.to_string(),
                location: ErrorLocation::from(Location::caller()),
            }
        })?;

        config.validate()?;

        info!("Config loaded from {}", config_path.display());
        Ok(config)
    }

    /// Save config to {config_dir}/config.json using temp file + rename.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        self.validate()?;

        std::fs::create_dir_all(config_dir).map_err(|e| ConfigError::Write {
            path: config_dir.to_path_buf(),
            source: e,
            location: ErrorLocation::from(Location::caller()),
        })?;

        let config_path = config_dir.join(CONFIG_FILE_NAME);
        let temp_path = config_dir.join(format!("{CONFIG_FILE_NAME}.tmp"));

        let json = serde_json::to_string_pretty(self).map_err(|e| ConfigError::Serialize {
            reason: e.to_string(),
            location: ErrorLocation::from(Location::caller()),
        })?;

        std::fs::write(&temp_path, json).map_err(|e| ConfigError::Write {
            path: temp_path.clone(),
            source: e,
            location: ErrorLocation::from(Location::caller()),
        })?;

        std::fs::rename(&temp_path, &config_path).map_err(|e| ConfigError::Write {
            path: config_path.clone(),
            source: e,
            location: ErrorLocation::from(Location::caller()),
        })?;

        info!("Config saved to {}", config_path.display());
        Ok(())
    }

    /// Validate config values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] for the first invalid value found.
    #[track_caller]
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version == 0 || self.version > CONFIG_VERSION {
            return Err(validation(format!(
                "Invalid version: {} (expected 1-{})",
                self.version, CONFIG_VERSION
            )));
        }

        if let Some(ref url) = self.bridge.ipc_url {
            if !url.starts_with("ws://") && !url.starts_with("wss://") {
                return Err(validation(format!("Invalid IPC URL format: {url}")));
            }
        }

        if self.bridge.request_timeout_ms == 0 || self.bridge.connect_timeout_ms == 0 {
            return Err(validation(String::from("Bridge timeouts must be non-zero")));
        }

        let base_url = &self.backend.base_url;
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(validation(format!("Invalid backend URL format: {base_url}")));
        }

        if self.backend.timeout_secs == 0 {
            return Err(validation(String::from("Backend timeout must be non-zero")));
        }

        if !(100..=60_000).contains(&self.realtime.poll_interval_ms) {
            return Err(validation(format!(
                "Invalid poll interval: {}ms (must be 100-60000)",
                self.realtime.poll_interval_ms
            )));
        }

        if self.realtime.max_failures == 0 {
            return Err(validation(String::from("max_failures must be at least 1")));
        }

        if self.highlight.theme.is_empty() {
            return Err(validation(String::from("Highlight theme cannot be empty")));
        }

        Ok(())
    }
}

#[track_caller]
fn validation(reason: String) -> ConfigError {
    ConfigError::Validation {
        reason,
        location: ErrorLocation::from(Location::caller()),
    }
}
