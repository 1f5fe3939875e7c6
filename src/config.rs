//! Engine configuration
//!
//! Everything tunable about a session lives in [`EngineConfig`]: the
//! instrument address, history capacity, timer intervals, and the
//! scale-factor table. Configs are plain TOML; missing fields fall back to
//! the defaults, so a config file only needs to state what it changes.

use crate::error::{EngineError, Result};
use crate::protocol::ScaleTable;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration for one telemetry session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Instrument stream address (host:port)
    pub device_addr: String,
    /// Number of readings the history buffer retains
    pub history_capacity: usize,
    /// Initial chart sample period in milliseconds; a start-of-stream frame
    /// overrides it for the stream it opens
    pub chart_period_ms: f64,
    /// Sample request interval for the polled modes, milliseconds
    pub poll_interval_ms: u64,
    /// Delay before a reconnect attempt after the link drops, milliseconds
    pub reconnect_delay_ms: u64,
    /// Physical-unit conversion factors
    pub scales: ScaleTable,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            device_addr: "192.168.4.1:8266".to_string(),
            history_capacity: crate::types::DEFAULT_HISTORY_CAPACITY,
            chart_period_ms: 0.5,
            poll_interval_ms: 1000,
            reconnect_delay_ms: 2000,
            scales: ScaleTable::default(),
        }
    }
}

impl EngineConfig {
    /// Load a config from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        toml::from_str(&text)
            .map_err(|e| EngineError::Config(format!("failed to parse config: {}", e)))
    }

    /// Load a config, falling back to defaults if the file does not exist
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path.as_ref()) {
            Ok(config) => config,
            Err(e) => {
                if path.as_ref().exists() {
                    tracing::warn!("ignoring unreadable config: {}", e);
                }
                Self::default()
            }
        }
    }

    /// Save the config as TOML, creating parent directories as needed
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let text = toml::to_string_pretty(self)
            .map_err(|e| EngineError::Config(format!("failed to serialize config: {}", e)))?;
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path.as_ref(), text)?;
        Ok(())
    }

    /// Platform config file location (`<config dir>/telemeter-rs/config.toml`)
    pub fn default_path() -> Option<PathBuf> {
        dirs_next::config_dir().map(|dir| dir.join("telemeter-rs").join("config.toml"))
    }

    /// Reconnect delay as a [`Duration`]
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    /// Poll interval as a [`Duration`]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.history_capacity, 1000);
        assert_eq!(config.chart_period_ms, 0.5);
        assert_eq!(config.reconnect_delay(), Duration::from_millis(2000));
        assert_eq!(config.poll_interval(), Duration::from_millis(1000));
    }

    #[test]
    fn test_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let config = EngineConfig {
            device_addr: "10.0.0.7:9000".to_string(),
            scales: ScaleTable {
                voltage: 0.0125,
                ..ScaleTable::default()
            },
            ..EngineConfig::default()
        };
        config.save(&path).unwrap();

        let loaded = EngineConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "history_capacity = 500\n").unwrap();

        let config = EngineConfig::load(&path).unwrap();
        assert_eq!(config.history_capacity, 500);
        assert_eq!(config.reconnect_delay_ms, 2000);
        assert_eq!(config.scales, ScaleTable::default());
    }

    #[test]
    fn test_missing_file_falls_back() {
        let config = EngineConfig::load_or_default("/nonexistent/config.toml");
        assert_eq!(config, EngineConfig::default());
    }
}
