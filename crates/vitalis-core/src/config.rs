//! Engine configuration loaded from TOML.
//!
//! Search order: explicit path, `$XDG_CONFIG_HOME/vitalis/config.toml`,
//! `~/.config/vitalis/config.toml`, then built-in defaults.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Configurable delays, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Wait after a disconnect before dialing again
    pub reconnect_delay_ms: u64,
    /// Quiescence required before a content update is sent
    pub debounce_ms: u64,
    /// Lifetime of a non-critical intervention bubble
    pub auto_dismiss_ms: u64,
    /// Dashboard clock refresh period
    pub clock_period_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            reconnect_delay_ms: 3000,
            debounce_ms: 1500,
            auto_dismiss_ms: 15_000,
            clock_period_ms: 1000,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Event server URL
    pub url: String,
    /// Delays
    pub timing: TimingConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            url: "ws://localhost:8000/ws".to_string(),
            timing: TimingConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Parse and validate TOML text.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load from a specific file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// XDG-compliant config paths to search, most specific first.
    pub fn config_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
            paths.push(PathBuf::from(xdg).join("vitalis").join("config.toml"));
        }
        if let Ok(home) = std::env::var("HOME") {
            paths.push(
                PathBuf::from(home)
                    .join(".config")
                    .join("vitalis")
                    .join("config.toml"),
            );
        }
        paths
    }

    /// Load from the first readable config path, falling back to defaults.
    ///
    /// An explicit `path` must exist and parse; discovered files that fail to
    /// parse are skipped with a warning.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::load_from_file(path);
        }
        for candidate in Self::config_paths() {
            if !candidate.exists() {
                continue;
            }
            match Self::load_from_file(&candidate) {
                Ok(config) => {
                    debug!(path = %candidate.display(), "loaded config");
                    return Ok(config);
                }
                Err(e) => warn!(path = %candidate.display(), error = %e, "ignoring config"),
            }
        }
        Ok(Self::default())
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.url.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "url",
                reason: "must not be empty".to_string(),
            });
        }
        let delays = [
            ("timing.reconnect_delay_ms", self.timing.reconnect_delay_ms),
            ("timing.debounce_ms", self.timing.debounce_ms),
            ("timing.auto_dismiss_ms", self.timing.auto_dismiss_ms),
            ("timing.clock_period_ms", self.timing.clock_period_ms),
        ];
        for (field, value) in delays {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: "must be greater than zero".to_string(),
                });
            }
        }
        Ok(())
    }
}
