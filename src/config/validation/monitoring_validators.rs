//! Monitoring configuration validators
//!
//! This module provides validation implementations for MonitorConfig,
//! GlobalDefaults, DualCheckConfig, MetricsConfig and AlertConfig.

use super::trait_def::Validate;
use crate::config::models::*;
use std::collections::HashSet;
use tracing::debug;

const WEIGHT_TOLERANCE: f64 = 1e-6;

impl Validate for MonitorConfig {
    fn validate(&self) -> Result<(), String> {
        debug!("Validating monitor configuration");

        self.defaults.validate()?;
        self.scoring.validate()?;
        self.metrics.validate()?;
        self.alerts.validate()?;

        let mut seen = HashSet::new();
        for server in &self.servers {
            server.validate()?;
            if !seen.insert(server.name.as_str()) {
                return Err(format!("Duplicate server name '{}'", server.name));
            }
        }

        Ok(())
    }
}

impl Validate for GlobalDefaults {
    fn validate(&self) -> Result<(), String> {
        if self.timeout_ms == 0 {
            return Err("Default timeout must be greater than 0".to_string());
        }
        if self.check_interval_ms == 0 {
            return Err("Default check interval must be greater than 0".to_string());
        }
        self.retry
            .validate()
            .map_err(|e| format!("Default retry: {}", e))?;
        self.circuit_breaker
            .validate()
            .map_err(|e| format!("Default circuit_breaker: {}", e))?;
        Ok(())
    }
}

impl Validate for DualCheckConfig {
    fn validate(&self) -> Result<(), String> {
        for (label, weight) in [
            ("weight_protocol", self.weight_protocol),
            ("weight_endpoint", self.weight_endpoint),
        ] {
            if !(0.0..=1.0).contains(&weight) {
                return Err(format!("{} must be within [0, 1], got {}", label, weight));
            }
        }

        let sum = self.weight_protocol + self.weight_endpoint;
        if (sum - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(format!("Probe weights must sum to 1.0, got {}", sum));
        }

        if !(self.failure_threshold > 0.0
            && self.failure_threshold < self.degraded_threshold
            && self.degraded_threshold <= 1.0)
        {
            return Err(format!(
                "Thresholds must satisfy 0 < failure_threshold ({}) < degraded_threshold ({}) <= 1",
                self.failure_threshold, self.degraded_threshold
            ));
        }

        let min_weight = self.weight_protocol.min(self.weight_endpoint);
        if self.failure_threshold > min_weight + WEIGHT_TOLERANCE {
            return Err(format!(
                "failure_threshold ({}) cannot exceed the smallest probe weight ({})",
                self.failure_threshold, min_weight
            ));
        }

        if self.max_tool_pages == 0 {
            return Err("max_tool_pages must be greater than 0".to_string());
        }

        Ok(())
    }
}

impl Validate for MetricsConfig {
    fn validate(&self) -> Result<(), String> {
        if self.retention_secs == 0 {
            return Err("Metrics retention must be greater than 0".to_string());
        }
        if self.max_records_per_server == 0 {
            return Err("max_records_per_server must be greater than 0".to_string());
        }
        Ok(())
    }
}

impl Validate for AlertConfig {
    fn validate(&self) -> Result<(), String> {
        if self.enabled && self.history_size == 0 {
            return Err("Alert history size must be greater than 0 when alerts are enabled".to_string());
        }
        Ok(())
    }
}
