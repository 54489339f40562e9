//! Server profile validators
//!
//! Covers ServerProfile, AuthConfig and the per-server resilience policies
//! (RetryConfig, CircuitBreakerConfig).

use super::trait_def::Validate;
use super::probe_url::validate_probe_url;
use crate::config::models::*;
use crate::utils::error::recovery::{CircuitBreakerConfig, RetryConfig};

impl Validate for ServerProfile {
    fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Server name cannot be empty".to_string());
        }

        if let Some(url) = &self.protocol_url {
            validate_probe_url(url, &format!("Server '{}' protocol_url", self.name))?;
        }
        if let Some(url) = &self.status_url {
            validate_probe_url(url, &format!("Server '{}' status_url", self.name))?;
        }

        if self.timeout_ms == Some(0) {
            return Err(format!("Server '{}' timeout must be greater than 0", self.name));
        }
        if self.check_interval_ms == Some(0) {
            return Err(format!(
                "Server '{}' check interval must be greater than 0",
                self.name
            ));
        }
        if let Some(code) = self
            .expected_status_codes
            .iter()
            .find(|c| !(100..=599).contains(*c))
        {
            return Err(format!(
                "Server '{}' expected status code {} is not a valid HTTP status",
                self.name, code
            ));
        }
        if self.expected_tools.iter().any(|t| t.trim().is_empty()) {
            return Err(format!(
                "Server '{}' expected tool names cannot be empty",
                self.name
            ));
        }

        if let Some(retry) = &self.retry {
            retry
                .validate()
                .map_err(|e| format!("Server '{}' retry: {}", self.name, e))?;
        }
        if let Some(breaker) = &self.circuit_breaker {
            breaker
                .validate()
                .map_err(|e| format!("Server '{}' circuit_breaker: {}", self.name, e))?;
        }
        self.auth
            .validate()
            .map_err(|e| format!("Server '{}' auth: {}", self.name, e))?;

        Ok(())
    }
}

impl Validate for AuthConfig {
    fn validate(&self) -> Result<(), String> {
        match self.auth_type {
            AuthType::ApiKey | AuthType::BearerToken => {
                if self.value.as_deref().is_none_or(str::is_empty) {
                    return Err(format!(
                        "{:?} authentication requires a value",
                        self.auth_type
                    ));
                }
            }
            AuthType::Basic => {
                if self.username.as_deref().is_none_or(str::is_empty) {
                    return Err("Basic authentication requires a username".to_string());
                }
            }
            AuthType::None => {}
        }
        Ok(())
    }
}

impl Validate for RetryConfig {
    fn validate(&self) -> Result<(), String> {
        if self.base_delay_ms > self.max_delay_ms {
            return Err(format!(
                "base_delay_ms ({}) cannot exceed max_delay_ms ({})",
                self.base_delay_ms, self.max_delay_ms
            ));
        }
        if !(0.0..1.0).contains(&self.jitter_ratio) {
            return Err("jitter_ratio must be in [0, 1)".to_string());
        }
        Ok(())
    }
}

impl Validate for CircuitBreakerConfig {
    fn validate(&self) -> Result<(), String> {
        if self.failure_threshold == 0 {
            return Err("failure_threshold must be greater than 0".to_string());
        }
        if self.recovery_timeout_ms == 0 {
            return Err("recovery_timeout_ms must be greater than 0".to_string());
        }
        Ok(())
    }
}
