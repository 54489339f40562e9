//! Circuit breaker implementation for fault tolerance
//!
//! One breaker guards one server. The state machine is:
//!
//! ```text
//! CLOSED --(failure_threshold consecutive failures)--> OPEN
//! OPEN --(first call after recovery_timeout)--> HALF_OPEN
//! HALF_OPEN --(trial succeeds)--> CLOSED
//! HALF_OPEN --(trial fails)--> OPEN
//! ```

use super::types::{
    CircuitBreakerConfig, CircuitBreakerRecord, CircuitOpenError, CircuitState, CircuitTransition,
};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Circuit breaker bound to a single server
#[derive(Debug)]
pub struct CircuitBreaker {
    server_name: String,
    config: CircuitBreakerConfig,
    inner: Mutex<BreakerInner>,
}

#[derive(Debug)]
struct BreakerInner {
    state: CircuitState,
    consecutive_failures: u32,
    last_failure_at: Option<DateTime<Utc>>,
    recovery_deadline: Option<Instant>,
    recovery_at: Option<DateTime<Utc>>,
    trip_count: u64,
    trial_in_flight: bool,
}

impl BreakerInner {
    fn closed() -> Self {
        Self {
            state: CircuitState::Closed,
            consecutive_failures: 0,
            last_failure_at: None,
            recovery_deadline: None,
            recovery_at: None,
            trip_count: 0,
            trial_in_flight: false,
        }
    }
}

/// Admission to run one guarded operation.
///
/// The outcome must be reported with [`CallPermit::record_success`] or
/// [`CallPermit::record_failure`]. Dropping the permit without reporting
/// (for example when the operation was cancelled) counts neither way and
/// frees the half-open trial slot.
#[derive(Debug)]
pub struct CallPermit<'a> {
    breaker: &'a CircuitBreaker,
    trial: bool,
    settled: bool,
}

impl CallPermit<'_> {
    /// Whether this permit is the single HALF_OPEN trial
    pub fn is_trial(&self) -> bool {
        self.trial
    }

    pub fn record_success(mut self) -> Option<CircuitTransition> {
        self.settled = true;
        self.breaker.on_success()
    }

    pub fn record_failure(mut self) -> Option<CircuitTransition> {
        self.settled = true;
        self.breaker.on_failure()
    }
}

impl Drop for CallPermit<'_> {
    fn drop(&mut self) {
        if !self.settled && self.trial {
            debug!(server = %self.breaker.server_name, "half-open trial abandoned");
            self.breaker.inner.lock().trial_in_flight = false;
        }
    }
}

impl CircuitBreaker {
    /// Create a new circuit breaker
    pub fn new(server_name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        Self {
            server_name: server_name.into(),
            config,
            inner: Mutex::new(BreakerInner::closed()),
        }
    }

    pub fn server_name(&self) -> &str {
        &self.server_name
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Execute a future with circuit breaker protection.
    ///
    /// While the circuit is open the future is dropped without being polled.
    pub async fn call<F, T, E>(&self, f: F) -> Result<T, E>
    where
        F: std::future::Future<Output = Result<T, E>>,
        E: From<CircuitOpenError>,
    {
        let permit = self.try_acquire()?;
        match f.await {
            Ok(value) => {
                permit.record_success();
                Ok(value)
            }
            Err(error) => {
                permit.record_failure();
                Err(error)
            }
        }
    }

    /// Ask for admission; moves OPEN to HALF_OPEN once the recovery time passed
    pub fn try_acquire(&self) -> Result<CallPermit<'_>, CircuitOpenError> {
        let mut inner = self.inner.lock();

        match inner.state {
            CircuitState::Closed => Ok(CallPermit {
                breaker: self,
                trial: false,
                settled: false,
            }),
            CircuitState::Open => {
                let eligible = inner
                    .recovery_deadline
                    .is_none_or(|deadline| Instant::now() >= deadline);
                if eligible {
                    debug!(server = %self.server_name, "circuit transitioning from OPEN to HALF_OPEN");
                    inner.state = CircuitState::HalfOpen;
                    inner.trial_in_flight = true;
                    Ok(CallPermit {
                        breaker: self,
                        trial: true,
                        settled: false,
                    })
                } else {
                    Err(self.open_error(&inner))
                }
            }
            CircuitState::HalfOpen => {
                if inner.trial_in_flight {
                    Err(self.open_error(&inner))
                } else {
                    inner.trial_in_flight = true;
                    Ok(CallPermit {
                        breaker: self,
                        trial: true,
                        settled: false,
                    })
                }
            }
        }
    }

    fn open_error(&self, inner: &BreakerInner) -> CircuitOpenError {
        CircuitOpenError {
            server_name: self.server_name.clone(),
            failure_count: inner.consecutive_failures,
            recovery_at: inner.recovery_at.unwrap_or_else(Utc::now),
        }
    }

    fn on_success(&self) -> Option<CircuitTransition> {
        let mut inner = self.inner.lock();

        match inner.state {
            CircuitState::Closed => {
                inner.consecutive_failures = 0;
                None
            }
            CircuitState::HalfOpen => {
                info!(server = %self.server_name, "circuit closed after successful trial");
                inner.consecutive_failures = 0;
                inner.state = CircuitState::Closed;
                inner.trial_in_flight = false;
                inner.recovery_deadline = None;
                inner.recovery_at = None;
                Some(CircuitTransition {
                    from: CircuitState::HalfOpen,
                    to: CircuitState::Closed,
                })
            }
            // A call admitted while closed may finish after a sibling tripped
            // the circuit; it must not close an OPEN breaker directly.
            CircuitState::Open => None,
        }
    }

    fn on_failure(&self) -> Option<CircuitTransition> {
        let mut inner = self.inner.lock();
        inner.consecutive_failures = inner.consecutive_failures.saturating_add(1);
        inner.last_failure_at = Some(Utc::now());

        match inner.state {
            CircuitState::Closed if inner.consecutive_failures >= self.config.failure_threshold => {
                warn!(
                    server = %self.server_name,
                    failures = inner.consecutive_failures,
                    threshold = self.config.failure_threshold,
                    "circuit opened"
                );
                self.open(&mut inner);
                Some(CircuitTransition {
                    from: CircuitState::Closed,
                    to: CircuitState::Open,
                })
            }
            CircuitState::HalfOpen => {
                warn!(server = %self.server_name, "half-open trial failed, circuit reopened");
                inner.trial_in_flight = false;
                self.open(&mut inner);
                Some(CircuitTransition {
                    from: CircuitState::HalfOpen,
                    to: CircuitState::Open,
                })
            }
            CircuitState::Closed | CircuitState::Open => None,
        }
    }

    fn open(&self, inner: &mut BreakerInner) {
        let timeout = self.config.recovery_timeout();
        inner.state = CircuitState::Open;
        inner.trip_count += 1;
        inner.recovery_deadline = Some(Instant::now() + timeout);
        inner.recovery_at = Some(
            Utc::now() + chrono::Duration::from_std(timeout).unwrap_or(chrono::Duration::zero()),
        );
    }

    /// Get current circuit breaker state
    pub fn state(&self) -> CircuitState {
        self.inner.lock().state
    }

    /// Snapshot the breaker for reporting
    pub fn record(&self) -> CircuitBreakerRecord {
        let inner = self.inner.lock();
        CircuitBreakerRecord {
            server_name: self.server_name.clone(),
            state: inner.state,
            consecutive_failures: inner.consecutive_failures,
            last_failure_at: inner.last_failure_at,
            recovery_at: inner.recovery_at,
            trip_count: inner.trip_count,
        }
    }

    /// Force the breaker back to CLOSED (operator action); keeps the trip counter
    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        let trip_count = inner.trip_count;
        *inner = BreakerInner::closed();
        inner.trip_count = trip_count;
        info!(server = %self.server_name, "circuit breaker reset");
    }
}
