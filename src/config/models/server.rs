//! Monitored server profiles

use super::*;
use crate::utils::error::recovery::{CircuitBreakerConfig, RetryConfig};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// One monitored server.
///
/// A profile is immutable while a check cycle reads it; reconfiguration
/// replaces the whole set. Optional policy fields fall back to
/// [`GlobalDefaults`] via [`ServerProfile::apply_defaults`], and to crate
/// defaults when read without that step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerProfile {
    /// Unique server name
    pub name: String,

    /// JSON-RPC endpoint for the tools/list probe; `None` disables the probe
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol_url: Option<String>,

    /// Plain status endpoint; `None` disables the probe
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_url: Option<String>,

    /// Tool names the protocol probe must find
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub expected_tools: Vec<String>,

    /// Status codes accepted from the status endpoint; empty means any 2xx
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub expected_status_codes: Vec<u16>,

    /// Require a recognisable health indicator in the status body
    #[serde(default)]
    pub validate_status_body: bool,

    /// Per-attempt timeout in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,

    /// Interval between check cycles in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_interval_ms: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry: Option<RetryConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub circuit_breaker: Option<CircuitBreakerConfig>,

    /// Credentials attached to both probes
    #[serde(default, skip_serializing_if = "AuthConfig::is_none")]
    pub auth: AuthConfig,

    /// Static headers to send with every probe
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,

    /// Whether this server is checked at all
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl ServerProfile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            protocol_url: None,
            status_url: None,
            expected_tools: Vec::new(),
            expected_status_codes: Vec::new(),
            validate_status_body: false,
            timeout_ms: None,
            check_interval_ms: None,
            retry: None,
            circuit_breaker: None,
            auth: AuthConfig::default(),
            headers: HashMap::new(),
            enabled: true,
        }
    }

    pub fn with_protocol_url(mut self, url: impl Into<String>) -> Self {
        self.protocol_url = Some(url.into());
        self
    }

    pub fn with_status_url(mut self, url: impl Into<String>) -> Self {
        self.status_url = Some(url.into());
        self
    }

    pub fn with_expected_tools<I, S>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.expected_tools = tools.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    pub fn with_check_interval(mut self, interval: Duration) -> Self {
        self.check_interval_ms = Some(interval.as_millis() as u64);
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = Some(retry);
        self
    }

    pub fn with_circuit_breaker(mut self, breaker: CircuitBreakerConfig) -> Self {
        self.circuit_breaker = Some(breaker);
        self
    }

    pub fn with_auth(mut self, auth: AuthConfig) -> Self {
        self.auth = auth;
        self
    }

    /// Add a static header
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn with_body_validation(mut self, enabled: bool) -> Self {
        self.validate_status_body = enabled;
        self
    }

    /// Fill unset policy fields from the global defaults
    pub fn apply_defaults(&mut self, defaults: &GlobalDefaults) {
        self.timeout_ms.get_or_insert(defaults.timeout_ms);
        self.check_interval_ms
            .get_or_insert(defaults.check_interval_ms);
        self.retry.get_or_insert_with(|| defaults.retry.clone());
        self.circuit_breaker
            .get_or_insert_with(|| defaults.circuit_breaker.clone());
    }

    pub fn protocol_enabled(&self) -> bool {
        self.protocol_url.is_some()
    }

    pub fn endpoint_enabled(&self) -> bool {
        self.status_url.is_some()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms.unwrap_or_else(default_timeout_ms))
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_millis(
            self.check_interval_ms
                .unwrap_or_else(default_check_interval_ms),
        )
    }

    pub fn retry_config(&self) -> RetryConfig {
        self.retry.clone().unwrap_or_default()
    }

    pub fn breaker_config(&self) -> CircuitBreakerConfig {
        self.circuit_breaker.clone().unwrap_or_default()
    }

    /// Whether `status` is accepted from the status endpoint
    pub fn accepts_status(&self, status: u16) -> bool {
        if self.expected_status_codes.is_empty() {
            (200..300).contains(&status)
        } else {
            self.expected_status_codes.contains(&status)
        }
    }
}
