//! Error recovery and resilience utilities
//!
//! This module provides the per-server circuit breaker and the retry
//! backoff policy used by the resilient client.

mod circuit_breaker;
mod retry;
mod types;

pub use circuit_breaker::{CallPermit, CircuitBreaker};
pub use retry::{RetryPolicy, calculate_delay, calculate_delay_with_jitter};
pub use types::{
    CircuitBreakerConfig, CircuitBreakerRecord, CircuitOpenError, CircuitState,
    CircuitTransition, RetryConfig,
};
