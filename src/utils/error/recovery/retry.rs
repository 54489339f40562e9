//! Retry decisions with exponential backoff

use super::types::RetryConfig;
use crate::core::client::ErrorType;
use rand::Rng;
use std::time::Duration;

/// `min(base * 2^attempt, max)`, saturating for large attempts
pub fn calculate_delay(attempt: u32, base: Duration, max: Duration) -> Duration {
    let factor = 2f64.powi(attempt.min(63) as i32);
    let millis = base.as_millis() as f64 * factor;
    clamp_millis(millis, max)
}

/// `min(base * 2^attempt + jitter, max)` with jitter drawn from
/// `[0, jitter_ratio * base * 2^attempt)`.
///
/// A ratio below 1.0 keeps the sequence non-decreasing in `attempt`.
pub fn calculate_delay_with_jitter(
    attempt: u32,
    base: Duration,
    max: Duration,
    jitter_ratio: f64,
) -> Duration {
    let factor = 2f64.powi(attempt.min(63) as i32);
    let exponential = base.as_millis() as f64 * factor;
    let ratio = jitter_ratio.clamp(0.0, 0.999);
    let jitter = if ratio > 0.0 && exponential > 0.0 {
        rand::thread_rng().gen_range(0.0..ratio) * exponential
    } else {
        0.0
    };
    clamp_millis(exponential + jitter, max)
}

fn clamp_millis(millis: f64, max: Duration) -> Duration {
    let max_millis = max.as_millis() as f64;
    if !millis.is_finite() || millis >= max_millis {
        max
    } else {
        Duration::from_millis(millis.max(0.0) as u64)
    }
}

/// Retry policy for one server's check operations
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Whether an error of `kind` may be retried at all.
    ///
    /// Authentication, parsing, circuit-open and cancellation never are,
    /// whatever the configured set says.
    pub fn is_retryable(&self, kind: ErrorType) -> bool {
        kind.is_transient() && self.config.retryable_errors.contains(&kind)
    }

    /// Whether a failure on zero-based `attempt` should be followed by another attempt
    pub fn should_retry(&self, kind: ErrorType, attempt: u32) -> bool {
        attempt < self.config.max_retries && self.is_retryable(kind)
    }

    /// Backoff to sleep after the failed zero-based `attempt`
    pub fn delay_for(&self, attempt: u32) -> Duration {
        if self.config.jitter {
            calculate_delay_with_jitter(
                attempt,
                self.config.base_delay(),
                self.config.max_delay(),
                self.config.jitter_ratio,
            )
        } else {
            calculate_delay(attempt, self.config.base_delay(), self.config.max_delay())
        }
    }
}
