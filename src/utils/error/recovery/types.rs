//! Types and configurations for error recovery patterns

use crate::core::client::ErrorType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Circuit breaker state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CircuitState {
    /// Circuit is closed, requests flow normally
    Closed,
    /// Circuit is open, requests are rejected
    Open,
    /// Circuit is half-open, allowing a single trial request
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "CLOSED",
            CircuitState::Open => "OPEN",
            CircuitState::HalfOpen => "HALF_OPEN",
        }
    }
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A state change performed by a breaker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircuitTransition {
    pub from: CircuitState,
    pub to: CircuitState,
}

impl CircuitTransition {
    /// The breaker just started rejecting calls
    pub fn is_trip(&self) -> bool {
        self.to == CircuitState::Open
    }

    /// The breaker just closed again after a successful trial
    pub fn is_recovery(&self) -> bool {
        self.from != CircuitState::Closed && self.to == CircuitState::Closed
    }
}

/// Circuit breaker configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures that open the circuit
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
    /// Time the circuit stays open before a trial call is let through
    #[serde(default = "default_recovery_timeout_ms")]
    pub recovery_timeout_ms: u64,
}

fn default_failure_threshold() -> u32 {
    5
}

fn default_recovery_timeout_ms() -> u64 {
    60_000
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            recovery_timeout_ms: default_recovery_timeout_ms(),
        }
    }
}

impl CircuitBreakerConfig {
    pub fn new(failure_threshold: u32, recovery_timeout: Duration) -> Self {
        Self {
            failure_threshold,
            recovery_timeout_ms: recovery_timeout.as_millis() as u64,
        }
    }

    pub fn recovery_timeout(&self) -> Duration {
        Duration::from_millis(self.recovery_timeout_ms)
    }
}

/// Point-in-time view of one server's breaker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitBreakerRecord {
    pub server_name: String,
    pub state: CircuitState,
    pub consecutive_failures: u32,
    pub last_failure_at: Option<DateTime<Utc>>,
    /// When the next trial call becomes eligible (set while open)
    pub recovery_at: Option<DateTime<Utc>>,
    /// Lifetime number of CLOSED/HALF_OPEN -> OPEN transitions
    pub trip_count: u64,
}

/// Raised instead of invoking the operation while the circuit is open
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[error(
    "circuit breaker open for server '{server_name}' after {failure_count} consecutive failures, retry after {recovery_at}"
)]
pub struct CircuitOpenError {
    pub server_name: String,
    pub failure_count: u32,
    pub recovery_at: DateTime<Utc>,
}

/// Retry configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Retries after the first attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Base delay for exponential backoff
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    /// Upper bound for any single backoff sleep
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    /// Whether to add jitter to delays
    #[serde(default = "default_jitter")]
    pub jitter: bool,
    /// Jitter as a fraction of the exponential delay, in [0, 1)
    #[serde(default = "default_jitter_ratio")]
    pub jitter_ratio: f64,
    /// Error kinds that may be retried
    #[serde(default = "default_retryable_errors")]
    pub retryable_errors: Vec<ErrorType>,
}

fn default_max_retries() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    1_000
}

fn default_max_delay_ms() -> u64 {
    30_000
}

fn default_jitter() -> bool {
    true
}

fn default_jitter_ratio() -> f64 {
    0.1
}

fn default_retryable_errors() -> Vec<ErrorType> {
    vec![ErrorType::Connection, ErrorType::Timeout, ErrorType::Service]
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            jitter: default_jitter(),
            jitter_ratio: default_jitter_ratio(),
            retryable_errors: default_retryable_errors(),
        }
    }
}

impl RetryConfig {
    /// Configuration that never retries
    pub fn no_retries() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }
}
