//! Configuration loading and validation integration tests
//!
//! Config files are written to temp files, loaded the way the binary loads
//! them and handed to a monitor.

#[cfg(test)]
mod tests {
    use crate::common::{DualResultAssertions, McpServer};
    use crate::{assert_err, assert_ok};
    use std::io::Write;
    use tempfile::NamedTempFile;
    use toolgate_rs::config::models::{AuthType, MissingToolsPolicy};
    use toolgate_rs::core::health::OverallStatus;
    use toolgate_rs::{Config, HealthMonitor};

    fn write_config(yaml: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();
        file
    }

    fn invalid(yaml: &str) -> String {
        assert_err!(Config::from_yaml_str(yaml)).to_string()
    }

    // ==================== Loading ====================

    #[tokio::test]
    async fn test_loaded_config_drives_a_monitor() {
        let server = McpServer::start().await;
        server.with_tools(&["search", "fetch"]).await;
        server.with_ok_status().await;

        let yaml = format!(
            r#"
monitor:
  defaults:
    timeout_ms: 2000
    retry:
      max_retries: 0
  alerts:
    log_events: false
  servers:
    - name: web
      protocol_url: "{}"
      status_url: "{}"
      expected_tools: [search]
      validate_status_body: true
      auth:
        type: bearer_token
        value: abc
"#,
            server.protocol_url(),
            server.status_url()
        );
        let file = write_config(&yaml);

        let config = assert_ok!(Config::from_file(file.path()).await);
        let web = config.monitor().server("web").unwrap();
        assert_eq!(web.auth.auth_type, AuthType::BearerToken);

        let monitor = assert_ok!(HealthMonitor::new(config.monitor));
        let profile = monitor.profile("web").unwrap();
        assert_eq!(profile.timeout_ms, Some(2000));
        assert_eq!(profile.retry_config().max_retries, 0);

        let results = monitor.check_all_now().await;
        results[0].assert_status(OverallStatus::Healthy);
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = assert_ok!(Config::from_yaml_str(
            "monitor:\n  servers:\n    - name: api\n      status_url: http://localhost:8080/health\n"
        ));
        let scoring = &config.monitor().scoring;
        assert_eq!(scoring.weight_protocol, 0.6);
        assert_eq!(scoring.weight_endpoint, 0.4);
        assert_eq!(scoring.missing_tools_policy, MissingToolsPolicy::PartialCredit);

        let servers = config.servers();
        assert!(!servers[0].protocol_enabled());
        assert!(servers[0].endpoint_enabled());
        assert_eq!(servers[0].timeout_ms, Some(10_000));
    }

    #[tokio::test]
    async fn test_unparseable_file_is_config_error() {
        let file = write_config("monitor: [not, a, map");
        let err = assert_err!(Config::from_file(file.path()).await);
        assert!(err.is_config_error());
    }

    // ==================== Validation ====================

    #[test]
    fn test_duplicate_server_names_rejected() {
        let msg = invalid(
            r#"
monitor:
  servers:
    - name: api
      status_url: http://localhost/a
    - name: api
      status_url: http://localhost/b
"#,
        );
        assert!(msg.contains("Duplicate server name"), "{}", msg);
    }

    #[test]
    fn test_non_http_url_rejected() {
        let msg = invalid(
            "monitor:\n  servers:\n    - name: api\n      protocol_url: ws://localhost/mcp\n",
        );
        assert!(msg.contains("http:// or https://"), "{}", msg);
    }

    #[test]
    fn test_threshold_ordering_rejected() {
        let msg = invalid(
            "monitor:\n  scoring:\n    failure_threshold: 0.8\n    degraded_threshold: 0.7\n",
        );
        assert!(msg.contains("Thresholds"), "{}", msg);
    }

    #[test]
    fn test_failure_threshold_above_single_weight_rejected() {
        // 0.45 would let a lone healthy endpoint (0.4) score UNHEALTHY.
        let msg = invalid("monitor:\n  scoring:\n    failure_threshold: 0.45\n");
        assert!(msg.contains("smallest probe weight"), "{}", msg);
    }

    #[test]
    fn test_retry_delays_rejected() {
        let msg = invalid(
            "monitor:\n  defaults:\n    retry:\n      base_delay_ms: 5000\n      max_delay_ms: 100\n",
        );
        assert!(msg.contains("Default retry"), "{}", msg);
    }

    #[test]
    fn test_zero_breaker_threshold_rejected() {
        let msg = invalid(
            r#"
monitor:
  servers:
    - name: api
      status_url: http://localhost/health
      circuit_breaker:
        failure_threshold: 0
"#,
        );
        assert!(msg.contains("failure_threshold must be greater than 0"), "{}", msg);
    }
}
