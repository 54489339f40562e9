//! Per-server call statistics

use super::classifier::ErrorType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Accumulated call statistics for one server.
///
/// `total_calls`, `successful_calls` and `failed_calls` count individual
/// attempts that reached the network. `error_counts` counts errors surfaced
/// to the caller after retries, keyed by classified kind. Circuit-open
/// rejections never count as calls.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConnectionStats {
    pub server_name: String,
    pub total_calls: u64,
    pub successful_calls: u64,
    pub failed_calls: u64,
    pub rejected_calls: u64,
    pub retries: u64,
    pub consecutive_failures: u32,
    pub circuit_breaker_trips: u64,
    pub error_counts: BTreeMap<ErrorType, u64>,
    pub last_success_at: Option<DateTime<Utc>>,
    pub last_failure_at: Option<DateTime<Utc>>,
}

impl ConnectionStats {
    pub fn new(server_name: impl Into<String>) -> Self {
        Self {
            server_name: server_name.into(),
            ..Self::default()
        }
    }

    pub(crate) fn record_success(&mut self) {
        self.total_calls += 1;
        self.successful_calls += 1;
        self.consecutive_failures = 0;
        self.last_success_at = Some(Utc::now());
    }

    pub(crate) fn record_failure(&mut self) {
        self.total_calls += 1;
        self.failed_calls += 1;
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.last_failure_at = Some(Utc::now());
    }

    pub(crate) fn record_surfaced(&mut self, kind: ErrorType) {
        *self.error_counts.entry(kind).or_insert(0) += 1;
    }

    pub(crate) fn record_rejection(&mut self) {
        self.rejected_calls += 1;
        self.record_surfaced(ErrorType::CircuitOpen);
    }

    pub(crate) fn record_retry(&mut self) {
        self.retries += 1;
    }

    pub(crate) fn record_trip(&mut self) {
        self.circuit_breaker_trips += 1;
    }

    /// Share of attempted calls that succeeded; 0.0 before any call
    pub fn success_rate(&self) -> f64 {
        if self.total_calls == 0 {
            0.0
        } else {
            self.successful_calls as f64 / self.total_calls as f64
        }
    }

    pub fn error_count(&self, kind: ErrorType) -> u64 {
        self.error_counts.get(&kind).copied().unwrap_or(0)
    }
}
