//! Metrics collector implementation for recording check results

use super::bounded::{BoundedPush, prune_before};
use super::helpers::{calculate_average, ratio};
use super::report::build_report;
use super::types::{
    AggregationReport, MetricsRecord, MetricsSnapshot, MetricsSummary, RecordedResult,
    ServerSummary, TimeWindow,
};
use crate::config::models::MetricsConfig;
use crate::core::health::{DualCheckResult, OverallStatus};
use crate::utils::error::{MonitorError, Result};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::RwLock;
use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use tracing::{debug, info, warn};

type History = Arc<RwLock<VecDeque<MetricsRecord>>>;

/// Per-server, time-bounded history of check results.
///
/// Each server's history sits behind its own lock, so writers for different
/// servers never contend and a reader only holds a lock while copying.
#[derive(Debug)]
pub struct MetricsCollector {
    config: MetricsConfig,
    histories: DashMap<String, History>,
}

impl MetricsCollector {
    pub fn new(config: MetricsConfig) -> Self {
        Self {
            config,
            histories: DashMap::new(),
        }
    }

    pub fn config(&self) -> &MetricsConfig {
        &self.config
    }

    fn retention_cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        TimeWindow::custom(self.config.retention()).start(now)
    }

    fn history(&self, server_name: &str) -> Option<History> {
        self.histories.get(server_name).map(|h| h.value().clone())
    }

    /// Append a result to its server's history
    pub fn record(&self, result: impl Into<RecordedResult>) {
        self.record_at(result, Utc::now());
    }

    /// Append with an explicit clock, pruning anything past retention
    pub fn record_at(&self, result: impl Into<RecordedResult>, now: DateTime<Utc>) {
        let result = result.into();
        let history = self
            .histories
            .entry(result.server_name().to_string())
            .or_default()
            .clone();

        let cutoff = self.retention_cutoff(now);
        let mut records = history.write();
        records.push_bounded(
            MetricsRecord {
                recorded_at: now,
                result,
            },
            self.config.max_records_per_server,
        );
        let pruned = prune_before(&mut records, cutoff);
        if pruned > 0 {
            debug!(pruned, "pruned expired metrics records");
        }
    }

    /// Copy of one server's history, oldest first
    pub fn records(&self, server_name: &str) -> Vec<MetricsRecord> {
        self.history(server_name)
            .map(|h| h.read().iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn record_count(&self, server_name: &str) -> usize {
        self.history(server_name).map_or(0, |h| h.read().len())
    }

    pub fn total_records(&self) -> usize {
        self.histories.iter().map(|h| h.value().read().len()).sum()
    }

    pub fn server_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.histories.iter().map(|h| h.key().clone()).collect();
        names.sort();
        names
    }

    /// Most recent combined result for a server
    pub fn latest_dual(&self, server_name: &str) -> Option<DualCheckResult> {
        let history = self.history(server_name)?;
        let records = history.read();
        records.iter().rev().find_map(|r| match &r.result {
            RecordedResult::Dual(dual) => Some(dual.clone()),
            _ => None,
        })
    }

    pub fn get_report(&self, server_name: &str, window: TimeWindow) -> AggregationReport {
        self.get_report_at(server_name, window, Utc::now())
    }

    /// Report for `server_name` over `window` ending at `now`; empty when the
    /// server has no history
    pub fn get_report_at(
        &self,
        server_name: &str,
        window: TimeWindow,
        now: DateTime<Utc>,
    ) -> AggregationReport {
        let records = self.records(server_name);
        build_report(
            Some(server_name.to_string()),
            window,
            now,
            &records,
            self.config.histogram_top_n,
        )
    }

    pub fn get_global_report(&self, window: TimeWindow) -> AggregationReport {
        self.get_global_report_at(window, Utc::now())
    }

    /// Report over every server's records
    pub fn get_global_report_at(&self, window: TimeWindow, now: DateTime<Utc>) -> AggregationReport {
        let records: Vec<MetricsRecord> = self
            .server_names()
            .iter()
            .flat_map(|name| self.records(name))
            .collect();
        build_report(None, window, now, &records, self.config.histogram_top_n)
    }

    fn server_summary(&self, server_name: &str) -> ServerSummary {
        let records = self.records(server_name);
        let duals: Vec<&DualCheckResult> = records
            .iter()
            .filter_map(|r| match &r.result {
                RecordedResult::Dual(dual) => Some(dual),
                _ => None,
            })
            .collect();
        let total_checks = duals.len() as u64;
        let successes = duals.iter().filter(|d| d.overall_success).count() as u64;

        match duals.last() {
            Some(latest) => ServerSummary {
                server_name: server_name.to_string(),
                status: latest.overall_status,
                health_score: Some(latest.health_score),
                available_paths: latest.available_paths.clone(),
                last_checked: Some(latest.timestamp),
                total_checks,
                success_rate: ratio(successes, total_checks),
                last_error: latest
                    .protocol
                    .as_ref()
                    .and_then(|p| p.error_type())
                    .or_else(|| latest.endpoint.as_ref().and_then(|e| e.error_type())),
            },
            None => ServerSummary {
                server_name: server_name.to_string(),
                status: OverallStatus::Unknown,
                health_score: None,
                available_paths: Vec::new(),
                last_checked: None,
                total_checks: 0,
                success_rate: 0.0,
                last_error: None,
            },
        }
    }

    /// Summary over every server with history
    pub fn summary(&self) -> MetricsSummary {
        self.summary_for(&self.server_names())
    }

    /// Summary over `server_names`; names without history count as UNKNOWN
    pub fn summary_for(&self, server_names: &[String]) -> MetricsSummary {
        let servers: Vec<ServerSummary> =
            server_names.iter().map(|n| self.server_summary(n)).collect();
        let count = |status: OverallStatus| servers.iter().filter(|s| s.status == status).count();
        let scores: Vec<f64> = servers.iter().filter_map(|s| s.health_score).collect();

        MetricsSummary {
            generated_at: Utc::now(),
            total_servers: servers.len(),
            healthy: count(OverallStatus::Healthy),
            degraded: count(OverallStatus::Degraded),
            unhealthy: count(OverallStatus::Unhealthy),
            unknown: count(OverallStatus::Unknown),
            average_health_score: calculate_average(&scores),
            total_records: server_names.iter().map(|n| self.record_count(n)).sum(),
            servers,
        }
    }

    /// Drop expired records everywhere; servers left empty are kept
    pub fn prune_expired(&self, now: DateTime<Utc>) -> usize {
        let cutoff = self.retention_cutoff(now);
        self.histories
            .iter()
            .map(|h| prune_before(&mut h.value().write(), cutoff))
            .sum()
    }

    pub fn remove_server(&self, server_name: &str) -> bool {
        let removed = self.histories.remove(server_name).is_some();
        if removed {
            info!(server = %server_name, "metrics history removed");
        }
        removed
    }

    pub fn reset(&self) {
        self.histories.clear();
        info!("metrics collector reset");
    }

    /// Copy of every server's full history
    pub fn export(&self) -> MetricsSnapshot {
        let servers: BTreeMap<String, Vec<MetricsRecord>> = self
            .server_names()
            .into_iter()
            .map(|name| {
                let records = self.records(&name);
                (name, records)
            })
            .collect();
        MetricsSnapshot {
            version: MetricsSnapshot::VERSION,
            exported_at: Utc::now(),
            servers,
        }
    }

    /// Merge a snapshot into the current histories.
    ///
    /// Records keep their original timestamps and are not pruned by
    /// retention here; the per-server cap still applies. Returns the number
    /// of records held for the imported servers afterwards.
    pub fn import(&self, snapshot: MetricsSnapshot) -> Result<usize> {
        if snapshot.version != MetricsSnapshot::VERSION {
            return Err(MonitorError::Validation(format!(
                "unsupported metrics snapshot version {}",
                snapshot.version
            )));
        }

        let mut imported = 0;
        for (server_name, incoming) in snapshot.servers {
            if let Some(stray) = incoming.iter().find(|r| r.result.server_name() != server_name) {
                warn!(
                    server = %server_name,
                    record_server = %stray.result.server_name(),
                    "snapshot record filed under another server"
                );
            }
            let history = self.histories.entry(server_name).or_default().clone();
            let mut records = history.write();
            let mut merged: Vec<MetricsRecord> = records.drain(..).chain(incoming).collect();
            merged.sort_by_key(|r| r.recorded_at);
            for record in merged {
                records.push_bounded(record, self.config.max_records_per_server);
            }
            imported += records.len();
        }
        info!(records = imported, "metrics snapshot imported");
        Ok(imported)
    }

    pub fn export_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.export())?)
    }

    pub fn import_json(&self, json: &str) -> Result<usize> {
        let snapshot: MetricsSnapshot = serde_json::from_str(json)?;
        self.import(snapshot)
    }
}
