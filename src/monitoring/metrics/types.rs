//! Metrics records, windows and report value objects

use crate::core::client::ErrorType;
use crate::core::health::{
    CheckPath, DualCheckResult, EndpointCheckResult, OverallStatus, ProtocolCheckResult,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Retrospective interval a report covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeWindow {
    Last5Minutes,
    Last15Minutes,
    LastHour,
    Last24Hours,
    Custom { secs: u64 },
}

impl TimeWindow {
    pub fn duration(&self) -> Duration {
        match self {
            TimeWindow::Last5Minutes => Duration::from_secs(5 * 60),
            TimeWindow::Last15Minutes => Duration::from_secs(15 * 60),
            TimeWindow::LastHour => Duration::from_secs(60 * 60),
            TimeWindow::Last24Hours => Duration::from_secs(24 * 60 * 60),
            TimeWindow::Custom { secs } => Duration::from_secs(*secs),
        }
    }

    pub fn custom(duration: Duration) -> Self {
        TimeWindow::Custom {
            secs: duration.as_secs(),
        }
    }

    /// Earliest timestamp inside the window ending at `now`
    pub fn start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        chrono::Duration::from_std(self.duration())
            .ok()
            .and_then(|span| now.checked_sub_signed(span))
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

/// One check result as stored by the collector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "result", rename_all = "snake_case")]
pub enum RecordedResult {
    Protocol(ProtocolCheckResult),
    Endpoint(EndpointCheckResult),
    Dual(DualCheckResult),
}

impl RecordedResult {
    pub fn server_name(&self) -> &str {
        match self {
            RecordedResult::Protocol(r) => &r.server_name,
            RecordedResult::Endpoint(r) => &r.server_name,
            RecordedResult::Dual(r) => &r.server_name,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            RecordedResult::Protocol(r) => r.timestamp,
            RecordedResult::Endpoint(r) => r.timestamp,
            RecordedResult::Dual(r) => r.timestamp,
        }
    }
}

impl From<ProtocolCheckResult> for RecordedResult {
    fn from(result: ProtocolCheckResult) -> Self {
        RecordedResult::Protocol(result)
    }
}

impl From<EndpointCheckResult> for RecordedResult {
    fn from(result: EndpointCheckResult) -> Self {
        RecordedResult::Endpoint(result)
    }
}

impl From<DualCheckResult> for RecordedResult {
    fn from(result: DualCheckResult) -> Self {
        RecordedResult::Dual(result)
    }
}

/// Timestamped, append-only history entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsRecord {
    pub recorded_at: DateTime<Utc>,
    pub result: RecordedResult,
}

/// Aggregates for one path, or the combined verdict
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathReport {
    pub total: u64,
    pub successes: u64,
    pub success_rate: f64,
    pub avg_response_time_ms: f64,
    /// Nearest-rank 95th percentile
    pub p95_response_time_ms: f64,
    /// Fraction of records where the path answered at all
    pub availability_rate: f64,
}

/// Value with its occurrence count
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistogramEntry {
    pub value: String,
    pub count: u64,
}

/// Aggregates for one server (or all servers) over a window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationReport {
    /// Server name, `None` for the fleet-wide report
    pub server_name: Option<String>,
    pub window: TimeWindow,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub protocol: PathReport,
    pub endpoint: PathReport,
    pub combined: PathReport,
    /// Share of completed tool listings that contained every expected tool
    pub tools_found_rate: f64,
    pub avg_tool_count: f64,
    pub avg_health_score: f64,
    pub status_counts: BTreeMap<String, u64>,
    pub top_status_codes: Vec<HistogramEntry>,
    pub top_error_types: Vec<HistogramEntry>,
}

/// Latest known state of one server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerSummary {
    pub server_name: String,
    pub status: OverallStatus,
    pub health_score: Option<f64>,
    pub available_paths: Vec<CheckPath>,
    pub last_checked: Option<DateTime<Utc>>,
    pub total_checks: u64,
    pub success_rate: f64,
    pub last_error: Option<ErrorType>,
}

/// Per-server and fleet-wide status counts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub generated_at: DateTime<Utc>,
    pub servers: Vec<ServerSummary>,
    pub total_servers: usize,
    pub healthy: usize,
    pub degraded: usize,
    pub unhealthy: usize,
    pub unknown: usize,
    /// Mean score of servers with at least one combined result
    pub average_health_score: f64,
    pub total_records: usize,
}

/// Serialized form of the whole collector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub version: u32,
    pub exported_at: DateTime<Utc>,
    pub servers: BTreeMap<String, Vec<MetricsRecord>>,
}

impl MetricsSnapshot {
    pub const VERSION: u32 = 1;

    pub fn record_count(&self) -> usize {
        self.servers.values().map(Vec::len).sum()
    }
}
