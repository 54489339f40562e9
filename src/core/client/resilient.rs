//! Resilient execution of probe operations
//!
//! The [`ResilientClient`] owns one circuit breaker and one stats block per
//! server. Every attempt is gated by the breaker, bounded by the profile's
//! timeout and, on a retryable failure, followed by a backoff sleep that
//! aborts as soon as the cancellation token fires.

use super::classifier::CheckError;
use super::stats::ConnectionStats;
use crate::config::models::ServerProfile;
use crate::utils::error::recovery::{
    CircuitBreaker, CircuitBreakerConfig, CircuitBreakerRecord, CircuitTransition, RetryPolicy,
};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Breaker state change published to listeners
#[derive(Debug, Clone)]
pub struct BreakerEvent {
    pub server_name: String,
    pub transition: CircuitTransition,
    pub record: CircuitBreakerRecord,
}

/// Breaker and stats owned by one server's check path.
///
/// The stats block outlives breaker rebuilds, so checks still holding an
/// older connection keep counting into the same place.
#[derive(Debug)]
pub struct ServerConnection {
    breaker: CircuitBreaker,
    pub(super) stats: Arc<Mutex<ConnectionStats>>,
}

impl ServerConnection {
    fn new(server_name: &str, config: CircuitBreakerConfig) -> Self {
        Self {
            breaker: CircuitBreaker::new(server_name, config),
            stats: Arc::new(Mutex::new(ConnectionStats::new(server_name))),
        }
    }

    /// Same stats, fresh breaker under `config`
    fn rebuilt(&self, config: CircuitBreakerConfig) -> Self {
        Self {
            breaker: CircuitBreaker::new(self.breaker.server_name(), config),
            stats: self.stats.clone(),
        }
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    pub fn stats(&self) -> ConnectionStats {
        self.stats.lock().clone()
    }
}

/// Client wrapping probe operations with breaker, timeout and retry
#[derive(Debug, Default)]
pub struct ResilientClient {
    connections: DashMap<String, Arc<ServerConnection>>,
    events: Option<mpsc::UnboundedSender<BreakerEvent>>,
}

impl ResilientClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish breaker trips and recoveries on `sender`
    pub fn with_event_sender(mut self, sender: mpsc::UnboundedSender<BreakerEvent>) -> Self {
        self.events = Some(sender);
        self
    }

    /// Connection for `profile`, created on first use.
    ///
    /// A changed breaker policy replaces the breaker but keeps the stats.
    pub fn connection(&self, profile: &ServerProfile) -> Arc<ServerConnection> {
        let config = profile.breaker_config();
        if let Some(existing) = self.connections.get(&profile.name) {
            if existing.breaker.config() == &config {
                return existing.clone();
            }
        }

        let mut entry = self
            .connections
            .entry(profile.name.clone())
            .or_insert_with(|| Arc::new(ServerConnection::new(&profile.name, config.clone())));
        if entry.breaker.config() != &config {
            debug!(server = %profile.name, "circuit breaker policy changed, rebuilding breaker");
            let replacement = entry.rebuilt(config);
            *entry = Arc::new(replacement);
        }
        entry.clone()
    }

    /// Run `operation` against the server described by `profile`.
    ///
    /// `operation` receives the zero-based attempt number. The final error
    /// is returned after retries are exhausted or on the first
    /// non-retryable failure. A circuit that opens between attempts ends
    /// the retries with the last real failure; `CircuitOpen` is only
    /// returned when no attempt reached the server.
    pub async fn execute<F, Fut, T>(
        &self,
        profile: &ServerProfile,
        cancel: &CancellationToken,
        mut operation: F,
    ) -> Result<T, CheckError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, CheckError>>,
    {
        let connection = self.connection(profile);
        let policy = RetryPolicy::new(profile.retry_config());
        let timeout = profile.timeout();
        let timeout_ms = timeout.as_millis() as u64;
        let mut attempt: u32 = 0;
        let mut last_error: Option<CheckError> = None;

        loop {
            if cancel.is_cancelled() {
                return Err(CheckError::Cancelled);
            }

            let permit = match connection.breaker.try_acquire() {
                Ok(permit) => permit,
                Err(open) => {
                    if let Some(error) = last_error.take() {
                        debug!(server = %profile.name, error = %error, attempts = attempt, "circuit opened, retries abandoned");
                        connection.stats.lock().record_surfaced(error.kind());
                        return Err(error);
                    }
                    debug!(server = %profile.name, "call rejected by open circuit");
                    connection.stats.lock().record_rejection();
                    return Err(CheckError::CircuitOpen(open));
                }
            };
            if attempt > 0 {
                connection.stats.lock().record_retry();
            }

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                result = tokio::time::timeout(timeout, operation(attempt)) => Some(result),
            };

            let result = match outcome {
                // Dropping the permit unsettled frees a half-open trial slot.
                None => return Err(CheckError::Cancelled),
                Some(Ok(result)) => result,
                Some(Err(_elapsed)) => Err(CheckError::Timeout { timeout_ms }),
            };

            let error = match result {
                Ok(value) => {
                    let transition = permit.record_success();
                    connection.stats.lock().record_success();
                    self.publish(&connection, transition);
                    return Ok(value);
                }
                Err(CheckError::Cancelled) => return Err(CheckError::Cancelled),
                Err(error) => error,
            };

            let kind = error.kind();
            let transition = permit.record_failure();
            {
                let mut stats = connection.stats.lock();
                stats.record_failure();
                if transition.is_some_and(|t| t.is_trip()) {
                    stats.record_trip();
                }
            }
            self.publish(&connection, transition);

            if !policy.should_retry(kind, attempt) {
                if kind.is_transient() {
                    warn!(server = %profile.name, error = %error, attempts = attempt + 1, "check failed after retries");
                } else {
                    debug!(server = %profile.name, error = %error, "non-retryable check failure");
                }
                connection.stats.lock().record_surfaced(kind);
                return Err(error);
            }

            let delay = policy.delay_for(attempt);
            debug!(
                server = %profile.name,
                attempt = attempt + 1,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "retrying check"
            );

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(CheckError::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }
            last_error = Some(error);
            attempt += 1;
        }
    }

    fn publish(&self, connection: &ServerConnection, transition: Option<CircuitTransition>) {
        let (Some(transition), Some(sender)) = (transition, self.events.as_ref()) else {
            return;
        };
        let event = BreakerEvent {
            server_name: connection.breaker.server_name().to_string(),
            transition,
            record: connection.breaker.record(),
        };
        if sender.send(event).is_err() {
            debug!(server = %connection.breaker.server_name(), "breaker event listener gone");
        }
    }

    pub fn stats(&self, server_name: &str) -> Option<ConnectionStats> {
        self.connections.get(server_name).map(|c| c.stats())
    }

    pub fn all_stats(&self) -> Vec<ConnectionStats> {
        let mut stats: Vec<_> = self.connections.iter().map(|c| c.stats()).collect();
        stats.sort_by(|a, b| a.server_name.cmp(&b.server_name));
        stats
    }

    pub fn breaker_record(&self, server_name: &str) -> Option<CircuitBreakerRecord> {
        self.connections.get(server_name).map(|c| c.breaker.record())
    }

    /// Operator reset of the accumulated stats; breaker state is untouched
    pub fn reset_stats(&self, server_name: &str) -> bool {
        match self.connections.get(server_name) {
            Some(connection) => {
                *connection.stats.lock() = ConnectionStats::new(server_name);
                true
            }
            None => false,
        }
    }

    /// Operator reset of the breaker back to CLOSED
    pub fn reset_breaker(&self, server_name: &str) -> bool {
        match self.connections.get(server_name) {
            Some(connection) => {
                connection.breaker.reset();
                true
            }
            None => false,
        }
    }

    /// Drop all state held for a server
    pub fn retire(&self, server_name: &str) -> bool {
        self.connections.remove(server_name).is_some()
    }

    pub fn server_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.connections.iter().map(|c| c.key().clone()).collect();
        names.sort();
        names
    }
}

