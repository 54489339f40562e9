//! Aggregation over a window of records

use super::helpers::{calculate_average, nearest_rank_percentile, ratio, top_n};
use super::types::{AggregationReport, MetricsRecord, PathReport, RecordedResult, TimeWindow};
use crate::core::client::{CheckError, ErrorType};
use crate::core::health::DualCheckResult;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};

#[derive(Default)]
struct PathAccumulator {
    total: u64,
    successes: u64,
    reachable: u64,
    latencies: Vec<f64>,
}

impl PathAccumulator {
    /// `latency` is `None` for calls the breaker rejected without I/O
    fn push(&mut self, success: bool, reachable: bool, latency: Option<f64>) {
        self.total += 1;
        if success {
            self.successes += 1;
        }
        if reachable {
            self.reachable += 1;
        }
        if let Some(latency) = latency {
            self.latencies.push(latency);
        }
    }

    fn finish(mut self) -> PathReport {
        self.latencies.sort_by(f64::total_cmp);
        PathReport {
            total: self.total,
            successes: self.successes,
            success_rate: ratio(self.successes, self.total),
            avg_response_time_ms: calculate_average(&self.latencies),
            p95_response_time_ms: nearest_rank_percentile(&self.latencies, 0.95),
            availability_rate: ratio(self.reachable, self.total),
        }
    }
}

fn rejected(error: Option<&CheckError>) -> bool {
    error.is_some_and(|e| e.kind() == ErrorType::CircuitOpen)
}

fn dual_rejected(result: &DualCheckResult) -> bool {
    let probes = [
        result.protocol.as_ref().map(|p| rejected(p.error.as_ref())),
        result.endpoint.as_ref().map(|e| rejected(e.error.as_ref())),
    ];
    let present: Vec<bool> = probes.into_iter().flatten().collect();
    !present.is_empty() && present.into_iter().all(|r| r)
}

/// Aggregate `records` falling in `window` ending at `now`.
///
/// Pure over its inputs, so two calls over unchanged records agree exactly.
pub(super) fn build_report<'a, I>(
    server_name: Option<String>,
    window: TimeWindow,
    now: DateTime<Utc>,
    records: I,
    histogram_top_n: usize,
) -> AggregationReport
where
    I: IntoIterator<Item = &'a MetricsRecord>,
{
    let window_start = window.start(now);
    let mut protocol = PathAccumulator::default();
    let mut endpoint = PathAccumulator::default();
    let mut combined = PathAccumulator::default();
    let mut listings = 0u64;
    let mut complete_listings = 0u64;
    let mut tool_counts = Vec::new();
    let mut health_scores = Vec::new();
    let mut status_counts: BTreeMap<String, u64> = BTreeMap::new();
    let mut status_codes: HashMap<String, u64> = HashMap::new();
    let mut error_types: HashMap<String, u64> = HashMap::new();

    let in_window = records
        .into_iter()
        .filter(|r| r.recorded_at >= window_start && r.recorded_at <= now);

    for record in in_window {
        match &record.result {
            RecordedResult::Protocol(r) => {
                let skip_latency = rejected(r.error.as_ref());
                protocol.push(
                    r.success,
                    r.reachable,
                    (!skip_latency).then_some(r.response_time_ms),
                );
                if let Some(kind) = r.error_type() {
                    *error_types.entry(kind.as_str().to_string()).or_default() += 1;
                } else {
                    listings += 1;
                    if r.missing_tools.is_empty() {
                        complete_listings += 1;
                    }
                    tool_counts.push(r.tool_count as f64);
                }
            }
            RecordedResult::Endpoint(r) => {
                let skip_latency = rejected(r.error.as_ref());
                endpoint.push(
                    r.success,
                    r.reachable,
                    (!skip_latency).then_some(r.response_time_ms),
                );
                if let Some(code) = r.status_code {
                    *status_codes.entry(code.to_string()).or_default() += 1;
                }
                if let Some(kind) = r.error_type() {
                    *error_types.entry(kind.as_str().to_string()).or_default() += 1;
                }
            }
            RecordedResult::Dual(r) => {
                combined.push(
                    r.overall_success,
                    r.reachable(),
                    (!dual_rejected(r)).then_some(r.combined_response_time_ms),
                );
                health_scores.push(r.health_score);
                *status_counts
                    .entry(r.overall_status.as_str().to_string())
                    .or_default() += 1;
            }
        }
    }

    AggregationReport {
        server_name,
        window,
        window_start,
        window_end: now,
        protocol: protocol.finish(),
        endpoint: endpoint.finish(),
        combined: combined.finish(),
        tools_found_rate: ratio(complete_listings, listings),
        avg_tool_count: calculate_average(&tool_counts),
        avg_health_score: calculate_average(&health_scores),
        status_counts,
        top_status_codes: top_n(status_codes, histogram_top_n),
        top_error_types: top_n(error_types, histogram_top_n),
    }
}
