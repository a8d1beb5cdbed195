use crate::error::config::ConfigError;
use crate::{DEFAULT_SERVER_ADDRESS, KEEPALIVE_INTERVAL_MS};

use common::ErrorLocation;

use std::panic::Location;
use std::path::Path;
use std::time::Duration;

use log::{info, warn};
use serde::{Deserialize, Serialize};

const CONFIG_FILE_NAME: &str = "remote-pad.json";
const CONFIG_VERSION: u32 = 1;
const MIN_KEEPALIVE_INTERVAL_MS: u64 = 100;
const MAX_KEEPALIVE_INTERVAL_MS: u64 = 60_000;

/// Environment variable that overrides `server.address`.
pub const SERVER_ADDRESS_ENV: &str = "REMOTE_PAD_SERVER_ADDRESS";

// ============================================
// ENUMS WITH DEFAULTS
// ============================================

/// When the keepalive tick finds no connection, how eagerly to reconnect.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReconnectPolicy {
    /// Reconnect on every tick, forever.
    Fixed,
    /// Skip ticks until an exponentially growing delay has passed. Never gives up.
    ExponentialBackoff {
        initial_interval_ms: u64,
        max_interval_ms: u64,
    },
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        ReconnectPolicy::Fixed
    }
}

/// Which decoded image wins when decodes complete out of receipt order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ImageOrdering {
    /// A decode that finishes after a newer image is already shown is discarded.
    LastReceivedWins,
    /// Whatever decode finishes last is shown, even if it was received earlier.
    LastDecodeWins,
}

impl Default for ImageOrdering {
    fn default() -> Self {
        ImageOrdering::LastReceivedWins
    }
}

// ============================================
// CONFIG STRUCTS
// ============================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerConfig {
    /// `host:port`, or a full `ws://` / `wss://` URL.
    #[serde(default = "default_address")]
    pub address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConnectionConfig {
    #[serde(default = "default_keepalive_interval_ms")]
    pub keepalive_interval_ms: u64,
    #[serde(default)]
    pub reconnect: ReconnectPolicy,
}

impl ConnectionConfig {
    pub fn keepalive_interval(&self) -> Duration {
        Duration::from_millis(self.keepalive_interval_ms)
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            keepalive_interval_ms: default_keepalive_interval_ms(),
            reconnect: ReconnectPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageConfig {
    #[serde(default)]
    pub ordering: ImageOrdering,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientConfig {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub connection: ConnectionConfig,

    #[serde(default)]
    pub images: ImageConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            server: ServerConfig::default(),
            connection: ConnectionConfig::default(),
            images: ImageConfig::default(),
        }
    }
}

// ============================================
// DEFAULT FUNCTIONS
// ============================================

fn default_version() -> u32 {
    CONFIG_VERSION
}
fn default_address() -> String {
    DEFAULT_SERVER_ADDRESS.to_string()
}
fn default_keepalive_interval_ms() -> u64 {
    KEEPALIVE_INTERVAL_MS
}

// ============================================
// IMPLEMENTATION
// ============================================

impl ClientConfig {
    /// Load config from `{config_dir}/remote-pad.json`.
    ///
    /// A missing file yields the defaults. A file that exists but cannot be read,
    /// parsed or validated is an error so a typo is not silently ignored.
    pub fn load(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            info!(
                "Config file not found at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path).map_err(|e| ConfigError::Read {
            location: ErrorLocation::from(Location::caller()),
            path: config_path.clone(),
            source: e,
        })?;

        let config: ClientConfig = serde_json::from_str(&contents).map_err(|e| {
            warn!("Failed to parse config JSON: {e}");
            ConfigError::Parse {
                location: ErrorLocation::from(Location::caller()),
                path: config_path.clone(),
                reason: e.to_string(),
            }
        })?;

        config.validate()?;

        info!("Config loaded from {}", config_path.display());
        Ok(config)
    }

    /// Save config to `{config_dir}/remote-pad.json` via temp file + rename.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        self.validate()?;

        std::fs::create_dir_all(config_dir).map_err(|e| ConfigError::Write {
            location: ErrorLocation::from(Location::caller()),
            path: config_dir.to_path_buf(),
            source: e,
        })?;

        let config_path = config_dir.join(CONFIG_FILE_NAME);
        let temp_path = config_dir.join(format!("{CONFIG_FILE_NAME}.tmp"));

        let json = serde_json::to_string_pretty(self).map_err(|e| ConfigError::Serialize {
            location: ErrorLocation::from(Location::caller()),
            reason: e.to_string(),
        })?;

        std::fs::write(&temp_path, json).map_err(|e| ConfigError::Write {
            location: ErrorLocation::from(Location::caller()),
            path: temp_path.clone(),
            source: e,
        })?;

        std::fs::rename(&temp_path, &config_path).map_err(|e| ConfigError::Write {
            location: ErrorLocation::from(Location::caller()),
            path: config_path.clone(),
            source: e,
        })?;

        info!("Config saved to {}", config_path.display());
        Ok(())
    }

    /// Validate config values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] if any value is out of range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version == 0 || self.version > CONFIG_VERSION {
            return Err(ConfigError::validation(format!(
                "Invalid version: {} (expected 1-{CONFIG_VERSION})",
                self.version
            )));
        }

        if self.server.address.trim().is_empty() {
            return Err(ConfigError::validation("server.address cannot be empty"));
        }

        let keepalive = self.connection.keepalive_interval_ms;
        if !(MIN_KEEPALIVE_INTERVAL_MS..=MAX_KEEPALIVE_INTERVAL_MS).contains(&keepalive) {
            return Err(ConfigError::validation(format!(
                "Invalid keepalive interval: {keepalive}ms (must be {MIN_KEEPALIVE_INTERVAL_MS}-{MAX_KEEPALIVE_INTERVAL_MS}ms)"
            )));
        }

        if let ReconnectPolicy::ExponentialBackoff {
            initial_interval_ms,
            max_interval_ms,
        } = self.connection.reconnect
        {
            if initial_interval_ms == 0 || initial_interval_ms > max_interval_ms {
                return Err(ConfigError::validation(format!(
                    "Invalid reconnect backoff: initial {initial_interval_ms}ms, max {max_interval_ms}ms"
                )));
            }
        }

        Ok(())
    }

    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.override_server_address(std::env::var(SERVER_ADDRESS_ENV).ok());
    }

    /// Replace `server.address` when `address` is present and not blank.
    ///
    /// Returns true if the address changed.
    pub fn override_server_address(&mut self, address: Option<String>) -> bool {
        match address {
            Some(address) if !address.trim().is_empty() => {
                info!("Server address overridden: {address}");
                self.server.address = address.trim().to_string();
                true
            }
            _ => false,
        }
    }
}
