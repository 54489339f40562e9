//! Tests for metrics module

use super::*;
use crate::config::models::MetricsConfig;
use crate::core::client::CheckError;
use crate::core::health::{
    CheckPath, DualCheckResult, EndpointCheckResult, OverallStatus, ProtocolCheckResult,
};
use crate::utils::error::recovery::CircuitOpenError;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

fn protocol(server: &str, success: bool, ms: f64) -> ProtocolCheckResult {
    ProtocolCheckResult {
        server_name: server.to_string(),
        timestamp: Utc::now(),
        success,
        reachable: true,
        response_time_ms: ms,
        tool_count: 3,
        tool_names: vec!["a".into(), "b".into(), "c".into()],
        found_tools: vec!["a".into()],
        missing_tools: if success { vec![] } else { vec!["z".into()] },
        credit: if success { 1.0 } else { 0.5 },
        error: None,
        protocol_error: None,
        correlation_id: "cid".into(),
    }
}

fn endpoint(server: &str, status: u16, ms: f64) -> EndpointCheckResult {
    let success = (200..300).contains(&status);
    EndpointCheckResult {
        server_name: server.to_string(),
        timestamp: Utc::now(),
        success,
        reachable: true,
        response_time_ms: ms,
        status_code: Some(status),
        body: None,
        error: (!success).then(|| CheckError::Service {
            status: Some(status),
            code: None,
            message: "bad status".into(),
        }),
        validation_error: None,
    }
}

fn dual(server: &str, status: OverallStatus, score: f64) -> DualCheckResult {
    let available_paths = match status {
        OverallStatus::Healthy => vec![CheckPath::Protocol, CheckPath::Endpoint],
        OverallStatus::Degraded => vec![CheckPath::Protocol],
        _ => vec![],
    };
    DualCheckResult {
        server_name: server.to_string(),
        timestamp: Utc::now(),
        protocol: None,
        endpoint: None,
        overall_status: status,
        overall_success: !available_paths.is_empty(),
        combined_response_time_ms: 40.0,
        health_score: score,
        available_paths,
    }
}

fn collector() -> MetricsCollector {
    MetricsCollector::new(MetricsConfig::default())
}

fn at(base: DateTime<Utc>, secs: i64) -> DateTime<Utc> {
    base + Duration::seconds(secs)
}

#[test]
fn test_nearest_rank_percentile() {
    let values: Vec<f64> = (0..10).map(|i| 50.0 + 10.0 * i as f64).collect();
    // ceil(0.95 * 10) = 10th value
    assert_eq!(nearest_rank_percentile(&values, 0.95), 140.0);
    assert_eq!(nearest_rank_percentile(&values, 0.5), 90.0);
    assert_eq!(nearest_rank_percentile(&values, 0.0), 50.0);
    assert_eq!(nearest_rank_percentile(&[], 0.95), 0.0);

    let twenty: Vec<f64> = (1..=20).map(f64::from).collect();
    assert_eq!(nearest_rank_percentile(&twenty, 0.95), 19.0);
}

#[test]
fn test_calculate_average() {
    assert_eq!(calculate_average(&[1.0, 2.0, 3.0, 4.0, 5.0]), 3.0);
    assert_eq!(calculate_average(&[]), 0.0);
}

#[test]
fn test_report_over_window() {
    let metrics = collector();
    let base = Utc::now();
    let latencies = [50.0, 60.0, 70.0, 80.0, 90.0, 100.0, 110.0, 120.0, 130.0, 140.0];
    for (i, ms) in latencies.iter().enumerate() {
        metrics.record_at(endpoint("s", 200, *ms), at(base, i as i64));
    }
    metrics.record_at(endpoint("s", 503, 10.0), at(base, 11));

    let report = metrics.get_report_at("s", TimeWindow::Last5Minutes, at(base, 12));
    assert_eq!(report.endpoint.total, 11);
    assert_eq!(report.endpoint.successes, 10);
    assert!((report.endpoint.success_rate - 10.0 / 11.0).abs() < 1e-12);
    assert_eq!(report.endpoint.availability_rate, 1.0);
    assert_eq!(report.endpoint.p95_response_time_ms, 140.0);
    assert_eq!(report.top_status_codes[0].value, "200");
    assert_eq!(report.top_status_codes[0].count, 10);
    assert_eq!(report.top_error_types[0].value, "service_error");
    assert_eq!(report.protocol.total, 0);
}

#[test]
fn test_window_excludes_old_records() {
    let metrics = collector();
    let base = Utc::now();
    metrics.record_at(endpoint("s", 200, 10.0), base);
    metrics.record_at(endpoint("s", 200, 20.0), at(base, 600));

    let recent = metrics.get_report_at("s", TimeWindow::Last5Minutes, at(base, 601));
    assert_eq!(recent.endpoint.total, 1);
    assert_eq!(recent.endpoint.avg_response_time_ms, 20.0);

    let hour = metrics.get_report_at("s", TimeWindow::LastHour, at(base, 601));
    assert_eq!(hour.endpoint.total, 2);

    let custom = metrics.get_report_at("s", TimeWindow::Custom { secs: 2 }, at(base, 601));
    assert_eq!(custom.endpoint.total, 1);
}

#[test]
fn test_report_is_idempotent() {
    let metrics = collector();
    let base = Utc::now();
    metrics.record_at(protocol("s", true, 30.0), base);
    metrics.record_at(protocol("s", false, 70.0), base);
    metrics.record_at(dual("s", OverallStatus::Degraded, 0.7), base);

    let now = at(base, 5);
    let first = metrics.get_report_at("s", TimeWindow::LastHour, now);
    let second = metrics.get_report_at("s", TimeWindow::LastHour, now);
    assert_eq!(first, second);
    assert_eq!(first.tools_found_rate, 0.5);
    assert_eq!(first.avg_tool_count, 3.0);
    assert_eq!(first.status_counts.get("DEGRADED"), Some(&1));
}

#[test]
fn test_circuit_open_records_skip_latency() {
    let metrics = collector();
    let base = Utc::now();
    metrics.record_at(endpoint("s", 200, 100.0), base);
    let mut rejected = endpoint("s", 200, 0.0);
    rejected.success = false;
    rejected.reachable = false;
    rejected.status_code = None;
    rejected.error = Some(CheckError::CircuitOpen(CircuitOpenError {
        server_name: "s".into(),
        failure_count: 3,
        recovery_at: base,
    }));
    metrics.record_at(rejected, base);

    let report = metrics.get_report_at("s", TimeWindow::LastHour, base);
    assert_eq!(report.endpoint.total, 2);
    assert_eq!(report.endpoint.avg_response_time_ms, 100.0);
    assert_eq!(report.endpoint.availability_rate, 0.5);
    assert_eq!(report.top_error_types[0].value, "circuit_open_error");
}

#[test]
fn test_retention_prunes_on_record() {
    let metrics = MetricsCollector::new(MetricsConfig {
        retention_secs: 60,
        ..MetricsConfig::default()
    });
    let base = Utc::now();
    metrics.record_at(endpoint("s", 200, 10.0), base);
    metrics.record_at(endpoint("s", 200, 10.0), at(base, 30));
    metrics.record_at(endpoint("s", 200, 10.0), at(base, 90));
    assert_eq!(metrics.record_count("s"), 2);

    assert_eq!(metrics.prune_expired(at(base, 200)), 2);
    assert_eq!(metrics.record_count("s"), 0);
}

#[test]
fn test_max_records_per_server() {
    let metrics = MetricsCollector::new(MetricsConfig {
        max_records_per_server: 3,
        ..MetricsConfig::default()
    });
    let base = Utc::now();
    for i in 0..5 {
        metrics.record_at(endpoint("s", 200, i as f64), at(base, i));
    }
    let records = metrics.records("s");
    assert_eq!(records.len(), 3);
    assert_eq!(records[0].recorded_at, at(base, 2));
}

#[test]
fn test_export_reset_import_round_trip() {
    let metrics = collector();
    let base = Utc::now();
    metrics.record_at(protocol("a", true, 12.5), base);
    metrics.record_at(endpoint("a", 503, 7.25), base);
    metrics.record_at(dual("a", OverallStatus::Degraded, 0.6), base);
    metrics.record_at(dual("b", OverallStatus::Healthy, 1.0), at(base, 1));

    let before_a = metrics.get_report_at("a", TimeWindow::LastHour, at(base, 2));
    let json = metrics.export_json().unwrap();

    metrics.reset();
    assert_eq!(metrics.total_records(), 0);

    assert_eq!(metrics.import_json(&json).unwrap(), 4);
    let after_a = metrics.get_report_at("a", TimeWindow::LastHour, at(base, 2));
    assert_eq!(before_a, after_a);
    assert_eq!(metrics.records("b").len(), 1);
    assert_eq!(
        metrics.latest_dual("b").unwrap().overall_status,
        OverallStatus::Healthy
    );
}

#[test]
fn test_import_rejects_unknown_version() {
    let metrics = collector();
    let mut snapshot = metrics.export();
    snapshot.version = 99;
    assert!(metrics.import(snapshot).is_err());
}

#[test]
fn test_summary_counts() {
    let metrics = collector();
    metrics.record(dual("a", OverallStatus::Healthy, 1.0));
    metrics.record(dual("b", OverallStatus::Degraded, 0.6));
    metrics.record(dual("c", OverallStatus::Unhealthy, 0.0));
    metrics.record(endpoint("d", 200, 5.0));

    let summary = metrics.summary();
    assert_eq!(summary.total_servers, 4);
    assert_eq!(summary.healthy, 1);
    assert_eq!(summary.degraded, 1);
    assert_eq!(summary.unhealthy, 1);
    assert_eq!(summary.unknown, 1);
    assert!((summary.average_health_score - 1.6 / 3.0).abs() < 1e-12);

    let with_missing = metrics.summary_for(&["a".to_string(), "ghost".to_string()]);
    assert_eq!(with_missing.unknown, 1);
    assert_eq!(with_missing.healthy, 1);
}

#[test]
fn test_remove_server() {
    let metrics = collector();
    metrics.record(endpoint("a", 200, 1.0));
    assert!(metrics.remove_server("a"));
    assert!(!metrics.remove_server("a"));
    assert_eq!(metrics.get_report("a", TimeWindow::LastHour).endpoint.total, 0);
}

#[test]
fn test_global_report() {
    let metrics = collector();
    let base = Utc::now();
    metrics.record_at(endpoint("a", 200, 10.0), base);
    metrics.record_at(endpoint("b", 500, 30.0), base);
    let report = metrics.get_global_report_at(TimeWindow::Last15Minutes, base);
    assert!(report.server_name.is_none());
    assert_eq!(report.endpoint.total, 2);
    assert_eq!(report.endpoint.success_rate, 0.5);
}

#[tokio::test]
async fn test_concurrent_writers() {
    let metrics = Arc::new(collector());
    let mut handles = Vec::new();
    for server in 0..8 {
        let metrics = metrics.clone();
        handles.push(tokio::spawn(async move {
            for i in 0..50 {
                metrics.record(endpoint(&format!("s{}", server), 200, i as f64));
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }
    assert_eq!(metrics.total_records(), 400);
    assert_eq!(metrics.server_names().len(), 8);
}
