//! Configuration management for the monitor
//!
//! This module handles loading, validation, and environment overrides of the
//! monitor configuration. Watching the file for changes is left to the
//! embedding application, which hands new server sets to
//! [`crate::monitoring::HealthMonitor::reconfigure`].

pub mod models;
pub mod validation;

pub use models::*;
pub use validation::Validate;

use crate::utils::error::{MonitorError, Result};
use std::path::Path;
use tracing::{debug, info, warn};

/// Environment variable overriding the default check interval (ms)
pub const ENV_CHECK_INTERVAL_MS: &str = "TOOLGATE_CHECK_INTERVAL_MS";
/// Environment variable overriding the default probe timeout (ms)
pub const ENV_TIMEOUT_MS: &str = "TOOLGATE_TIMEOUT_MS";
/// Environment variable overriding metrics retention (seconds)
pub const ENV_RETENTION_SECS: &str = "TOOLGATE_RETENTION_SECS";

/// Main configuration struct for the monitor
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Config {
    /// Monitor configuration
    #[serde(default)]
    pub monitor: MonitorConfig,
}

impl Config {
    /// Load configuration from file
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading configuration from: {:?}", path);

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| MonitorError::Config(format!("Failed to read config file: {}", e)))?;

        let mut config = Self::parse_yaml(&content)?;
        config.apply_env_overrides();
        config.validate()?;

        debug!(servers = config.monitor.servers.len(), "Configuration loaded successfully");
        Ok(config)
    }

    /// Parse and validate configuration from a YAML string
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config = Self::parse_yaml(content)?;
        config.validate()?;
        Ok(config)
    }

    fn parse_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content)
            .map_err(|e| MonitorError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Apply `TOOLGATE_*` environment overrides on top of the file values
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let parse = |key: &str| -> Option<u64> {
            let raw = lookup(key)?;
            match raw.trim().parse::<u64>() {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!(variable = key, value = %raw, "Ignoring non-numeric override");
                    None
                }
            }
        };

        if let Some(value) = parse(ENV_CHECK_INTERVAL_MS) {
            self.monitor.defaults.check_interval_ms = value;
        }
        if let Some(value) = parse(ENV_TIMEOUT_MS) {
            self.monitor.defaults.timeout_ms = value;
        }
        if let Some(value) = parse(ENV_RETENTION_SECS) {
            self.monitor.metrics.retention_secs = value;
        }
    }

    /// Get monitor configuration
    pub fn monitor(&self) -> &MonitorConfig {
        &self.monitor
    }

    /// Enabled servers with defaults applied
    pub fn servers(&self) -> Vec<ServerProfile> {
        self.monitor.resolved_servers()
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        debug!("Validating configuration");
        self.monitor
            .validate()
            .map_err(|e| MonitorError::Config(format!("Monitor config error: {}", e)))
    }

    /// Convert to YAML string
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self)
            .map_err(|e| MonitorError::Config(format!("Failed to serialize config to YAML: {}", e)))
    }
}
