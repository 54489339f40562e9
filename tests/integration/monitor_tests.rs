//! HealthMonitor integration tests
//!
//! Exercise scheduling, alert delivery, metrics and live reconfiguration
//! through the public API.

#[cfg(test)]
mod tests {
    use crate::{assert_approx_eq, assert_ok};
    use crate::common::{DualResultAssertions, McpServer, ProfileFactory, monitor_config};
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;
    use toolgate_rs::core::health::OverallStatus;
    use toolgate_rs::monitoring::{AlertKind, ChannelSink, HealthMonitor, TimeWindow};
    use toolgate_rs::utils::error::recovery::CircuitBreakerConfig;

    async fn healthy_server() -> McpServer {
        let server = McpServer::start().await;
        server.with_tools(&["search"]).await;
        server.with_ok_status().await;
        server
    }

    #[tokio::test]
    async fn test_scheduled_checks_accumulate_history() {
        let server = healthy_server().await;
        let monitor = assert_ok!(HealthMonitor::new(monitor_config(vec![
            ProfileFactory::dual("web", &server)
        ])));

        assert_ok!(monitor.start().await);
        tokio::time::sleep(Duration::from_millis(200)).await;
        monitor.shutdown().await;

        let report = assert_ok!(monitor.report("web", TimeWindow::Last5Minutes));
        assert!(report.combined.total >= 2, "{:?}", report.combined);
        assert_eq!(report.combined.success_rate, 1.0);
        assert_eq!(report.protocol.total, report.combined.total);
        assert_eq!(report.status_counts.get("HEALTHY"), Some(&report.combined.total));
        assert!(report.endpoint.p95_response_time_ms < 2_000.0);
    }

    #[tokio::test]
    async fn test_alerts_reach_channel_sink() {
        let server = McpServer::start().await;
        server.with_protocol_status(500).await;
        server.with_status(500, json!({ "status": "down" })).await;

        let profile = ProfileFactory::dual("web", &server)
            .with_circuit_breaker(CircuitBreakerConfig::new(2, Duration::from_millis(50)));
        let monitor = assert_ok!(HealthMonitor::new(monitor_config(vec![profile])));
        let (sink, mut events) = ChannelSink::channel(16);
        monitor.alerts().add_sink(Arc::new(sink));

        let first = assert_ok!(monitor.check_server_now("web").await);
        first.assert_status(OverallStatus::Unhealthy);
        let opened = events.recv().await.unwrap();
        assert_eq!(opened.kind, AlertKind::CircuitOpened);
        assert_eq!(opened.server_name, "web");

        // The server recovers. After the recovery timeout one probe takes the
        // half-open trial slot; the other may still be rejected.
        server.reset().await;
        server.with_tools(&["search"]).await;
        server.with_ok_status().await;
        tokio::time::sleep(Duration::from_millis(80)).await;

        let trial = assert_ok!(monitor.check_server_now("web").await);
        assert_ne!(trial.overall_status, OverallStatus::Unhealthy);

        let settled = assert_ok!(monitor.check_server_now("web").await);
        settled.assert_status(OverallStatus::Healthy);

        let mut kinds = Vec::new();
        while let Ok(event) = events.try_recv() {
            kinds.push(event.kind);
        }
        assert!(kinds.contains(&AlertKind::CircuitRecovered), "{:?}", kinds);
        assert!(kinds.contains(&AlertKind::StatusChanged), "{:?}", kinds);

        let stats = monitor.alerts().stats();
        assert_eq!(stats.failed_deliveries, 0);
        assert_eq!(stats.total_alerts as usize, monitor.alerts().history().len());
    }

    #[tokio::test]
    async fn test_metrics_survive_export_and_import() {
        let server = healthy_server().await;
        let monitor = assert_ok!(HealthMonitor::new(monitor_config(vec![
            ProfileFactory::dual("web", &server)
        ])));
        monitor.check_all_now().await;
        monitor.check_all_now().await;

        let json = assert_ok!(monitor.metrics().export_json());

        let restored = assert_ok!(HealthMonitor::new(monitor_config(vec![
            ProfileFactory::dual("web", &server)
        ])));
        let imported = assert_ok!(restored.metrics().import_json(&json));
        assert_eq!(imported, 6);

        let original = assert_ok!(monitor.report("web", TimeWindow::LastHour));
        let copy = assert_ok!(restored.report("web", TimeWindow::LastHour));
        assert_eq!(original.combined.total, copy.combined.total);
        assert_eq!(original.combined.successes, copy.combined.successes);
        assert_approx_eq!(
            original.combined.avg_response_time_ms,
            copy.combined.avg_response_time_ms,
            1e-6
        );
        assert_eq!(original.status_counts, copy.status_counts);
    }

    #[tokio::test]
    async fn test_summary_across_servers() {
        let healthy = healthy_server().await;
        let degraded = McpServer::start().await;
        degraded.with_tools(&["search"]).await;
        degraded.with_status(503, json!({ "status": "down" })).await;

        let monitor = assert_ok!(HealthMonitor::new(monitor_config(vec![
            ProfileFactory::dual("a-healthy", &healthy),
            ProfileFactory::dual("b-degraded", &degraded),
            ProfileFactory::unreachable("dead"),
        ])));

        let results = monitor.check_all_now().await;
        let names: Vec<&str> = results.iter().map(|r| r.server_name.as_str()).collect();
        assert_eq!(names, vec!["a-healthy", "b-degraded", "dead"]);

        let summary = monitor.summary();
        assert_eq!(summary.total_servers, 3);
        assert_eq!(summary.healthy, 1);
        assert_eq!(summary.degraded, 1);
        assert_eq!(summary.unhealthy, 1);
        assert_eq!(summary.unknown, 0);

        let global = monitor.global_report(TimeWindow::Last5Minutes);
        assert!(global.server_name.is_none());
        assert_eq!(global.combined.total, 3);
    }

    #[tokio::test]
    async fn test_reconfigure_adds_server_while_running() {
        let first = healthy_server().await;
        let second = healthy_server().await;
        let monitor = assert_ok!(HealthMonitor::new(monitor_config(vec![
            ProfileFactory::dual("first", &first)
        ])));
        assert_ok!(monitor.start().await);

        assert_ok!(
            monitor
                .reconfigure(vec![
                    ProfileFactory::dual("first", &first),
                    ProfileFactory::dual("second", &second),
                ])
                .await
        );
        tokio::time::sleep(Duration::from_millis(150)).await;

        assert_eq!(monitor.server_names(), vec!["first", "second"]);
        assert!(monitor.latest_result("second").is_some());
        assert!(second.requests("POST").await >= 1);

        monitor.shutdown().await;
    }
}
