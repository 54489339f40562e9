//! Monitor configuration

use super::*;
use crate::utils::error::recovery::{CircuitBreakerConfig, RetryConfig};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Top-level monitor configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Policies inherited by every server
    #[serde(default)]
    pub defaults: GlobalDefaults,
    /// Dual check scoring
    #[serde(default)]
    pub scoring: DualCheckConfig,
    /// Metrics retention
    #[serde(default)]
    pub metrics: MetricsConfig,
    /// Alert dispatch
    #[serde(default)]
    pub alerts: AlertConfig,
    /// Monitored servers
    #[serde(default)]
    pub servers: Vec<ServerProfile>,
}

impl MonitorConfig {
    /// Enabled servers with the global defaults applied
    pub fn resolved_servers(&self) -> Vec<ServerProfile> {
        self.servers
            .iter()
            .filter(|s| s.enabled)
            .cloned()
            .map(|mut s| {
                s.apply_defaults(&self.defaults);
                s
            })
            .collect()
    }

    pub fn server(&self, name: &str) -> Option<&ServerProfile> {
        self.servers.iter().find(|s| s.name == name)
    }
}

/// Defaults for per-server policies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalDefaults {
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_check_interval_ms")]
    pub check_interval_ms: u64,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub circuit_breaker: CircuitBreakerConfig,
    /// How long a removed server's breaker, stats and history survive
    #[serde(default = "default_retirement_grace_ms")]
    pub retirement_grace_ms: u64,
}

impl Default for GlobalDefaults {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            check_interval_ms: default_check_interval_ms(),
            retry: RetryConfig::default(),
            circuit_breaker: CircuitBreakerConfig::default(),
            retirement_grace_ms: default_retirement_grace_ms(),
        }
    }
}

impl GlobalDefaults {
    pub fn retirement_grace(&self) -> Duration {
        Duration::from_millis(self.retirement_grace_ms)
    }
}

/// Metrics collector configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Records older than this are pruned on write
    #[serde(default = "default_retention_secs")]
    pub retention_secs: u64,
    /// Hard cap on stored records per server
    #[serde(default = "default_max_records_per_server")]
    pub max_records_per_server: usize,
    /// Entries kept in report histograms
    #[serde(default = "default_histogram_top_n")]
    pub histogram_top_n: usize,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            retention_secs: default_retention_secs(),
            max_records_per_server: default_max_records_per_server(),
            histogram_top_n: default_histogram_top_n(),
        }
    }
}

impl MetricsConfig {
    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_secs)
    }
}

/// Alert dispatcher configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertConfig {
    /// Dispatch alerts at all
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Log every alert through tracing
    #[serde(default = "default_true")]
    pub log_events: bool,
    /// Alerts kept in memory for inspection
    #[serde(default = "default_alert_history_size")]
    pub history_size: usize,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            log_events: true,
            history_size: default_alert_history_size(),
        }
    }
}
