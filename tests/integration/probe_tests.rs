//! Dual check integration tests
//!
//! Both probes run over real HTTP against wiremock servers.

#[cfg(test)]
mod tests {
    use crate::assert_approx_eq;
    use crate::common::{DualResultAssertions, McpServer, ProfileFactory};
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;
    use toolgate_rs::config::models::{AuthConfig, DualCheckConfig, MissingToolsPolicy};
    use toolgate_rs::core::client::{ErrorType, ResilientClient};
    use toolgate_rs::core::health::{CheckPath, DualCheckOrchestrator, OverallStatus};
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, Request, ResponseTemplate};

    fn orchestrator(scoring: DualCheckConfig) -> DualCheckOrchestrator {
        DualCheckOrchestrator::new(Arc::new(ResilientClient::new()), scoring)
    }

    // ==================== Healthy and degraded ====================

    #[tokio::test]
    async fn test_healthy_server_over_http() {
        let server = McpServer::start().await;
        server.with_tools(&["search", "fetch"]).await;
        server.with_ok_status().await;

        let profile = ProfileFactory::dual("web", &server).with_expected_tools(["search"]);
        let result = orchestrator(DualCheckConfig::default())
            .check_server(&profile, &CancellationToken::new())
            .await;

        result.assert_status(OverallStatus::Healthy);
        result.assert_paths(&[CheckPath::Protocol, CheckPath::Endpoint]);
        assert_approx_eq!(result.health_score, 1.0);

        let protocol = result.protocol.unwrap();
        assert_eq!(protocol.tool_count, 2);
        assert_eq!(protocol.found_tools, vec!["search".to_string()]);
        assert!(!protocol.correlation_id.is_empty());
        assert_eq!(result.endpoint.unwrap().body.unwrap()["status"], "ok");
    }

    #[tokio::test]
    async fn test_status_endpoint_down_is_degraded() {
        let server = McpServer::start().await;
        server.with_tools(&["search"]).await;
        server.with_status(503, json!({ "status": "down" })).await;

        let profile = ProfileFactory::dual("web", &server);
        let result = orchestrator(DualCheckConfig::default())
            .check_server(&profile, &CancellationToken::new())
            .await;

        result.assert_status(OverallStatus::Degraded);
        result.assert_paths(&[CheckPath::Protocol]);
        result.assert_endpoint_error(ErrorType::Service);
        assert_approx_eq!(result.health_score, 0.6);
        assert!(result.reachable());
    }

    #[tokio::test]
    async fn test_missing_tools_policies() {
        let server = McpServer::start().await;
        server.with_tools(&["search"]).await;
        server.with_ok_status().await;
        let profile =
            ProfileFactory::dual("web", &server).with_expected_tools(["search", "fetch"]);

        let partial = orchestrator(DualCheckConfig::default())
            .check_server(&profile, &CancellationToken::new())
            .await;
        partial.assert_status(OverallStatus::Degraded);
        assert_approx_eq!(partial.health_score, 0.7);
        assert_eq!(
            partial.protocol.as_ref().unwrap().missing_tools,
            vec!["fetch".to_string()]
        );

        let strict = orchestrator(DualCheckConfig {
            missing_tools_policy: MissingToolsPolicy::Fail,
            ..DualCheckConfig::default()
        })
        .check_server(&profile, &CancellationToken::new())
        .await;
        strict.assert_status(OverallStatus::Degraded);
        assert_approx_eq!(strict.health_score, 0.4);

        // Missing tools are a content problem, not a transport one.
        assert_eq!(server.requests("POST").await, 2);
    }

    // ==================== Wire behavior ====================

    #[tokio::test]
    async fn test_pagination_over_http() {
        let server = McpServer::start().await;
        server
            .with_paged_tools(vec![vec!["a", "b"], vec!["c"], vec!["d"]])
            .await;
        server.with_ok_status().await;

        let profile = ProfileFactory::protocol_only("paged", &server).with_expected_tools(["d"]);
        let result = orchestrator(DualCheckConfig::default())
            .check_server(&profile, &CancellationToken::new())
            .await;

        result.assert_status(OverallStatus::Healthy);
        assert_eq!(result.protocol.unwrap().tool_names, vec!["a", "b", "c", "d"]);
        assert_eq!(server.requests("POST").await, 3);
        assert_eq!(server.requests("GET").await, 0);
    }

    #[tokio::test]
    async fn test_credentials_are_sent_on_both_paths() {
        let server = McpServer::start().await;
        let authorized = |m: &str, p: &str| {
            Mock::given(method(m))
                .and(path(p.to_string()))
                .and(header("authorization", "Bearer s3cret"))
                .and(header("x-tenant", "blue"))
        };
        authorized("POST", "/mcp")
            .respond_with(|request: &Request| {
                let body: serde_json::Value =
                    serde_json::from_slice(&request.body).unwrap_or_default();
                ResponseTemplate::new(200).set_body_json(json!({
                    "jsonrpc": "2.0",
                    "id": body["id"],
                    "result": { "tools": [{ "name": "search" }] }
                }))
            })
            .mount(&server.server)
            .await;
        authorized("GET", "/status")
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "healthy": true })))
            .mount(&server.server)
            .await;

        let profile = ProfileFactory::dual("secure", &server)
            .with_auth(AuthConfig::bearer("s3cret"))
            .with_header("X-Tenant", "blue")
            .with_body_validation(true);
        let result = orchestrator(DualCheckConfig::default())
            .check_server(&profile, &CancellationToken::new())
            .await;

        result.assert_status(OverallStatus::Healthy);
    }

    #[tokio::test]
    async fn test_unauthorized_protocol_is_not_retried() {
        let server = McpServer::start().await;
        server.with_protocol_status(401).await;
        server.with_ok_status().await;

        let profile =
            ProfileFactory::dual("locked", &server).with_retry(ProfileFactory::fast_retry(3));
        let client = Arc::new(ResilientClient::new());
        let result = DualCheckOrchestrator::new(client.clone(), DualCheckConfig::default())
            .check_server(&profile, &CancellationToken::new())
            .await;

        result.assert_status(OverallStatus::Degraded);
        result.assert_protocol_error(ErrorType::Authentication);
        result.assert_paths(&[CheckPath::Endpoint]);
        assert_eq!(server.requests("POST").await, 1);

        let stats = client.stats("locked").unwrap();
        assert_eq!(stats.retries, 0);
        assert_eq!(stats.error_count(ErrorType::Authentication), 1);
    }

    #[tokio::test]
    async fn test_service_errors_are_retried() {
        let server = McpServer::start().await;
        server.with_protocol_status(502).await;

        let profile = ProfileFactory::protocol_only("flaky", &server)
            .with_retry(ProfileFactory::fast_retry(2));
        let client = Arc::new(ResilientClient::new());
        let result = DualCheckOrchestrator::new(client.clone(), DualCheckConfig::default())
            .check_server(&profile, &CancellationToken::new())
            .await;

        result.assert_status(OverallStatus::Unhealthy);
        result.assert_protocol_error(ErrorType::Service);
        assert_eq!(server.requests("POST").await, 3);
        assert_eq!(client.stats("flaky").unwrap().retries, 2);
    }

    #[tokio::test]
    async fn test_rpc_error_object_is_parsing_error() {
        let server = McpServer::start().await;
        server.with_rpc_error(-32601, "Method not found").await;

        let profile = ProfileFactory::protocol_only("old", &server);
        let result = orchestrator(DualCheckConfig::default())
            .check_server(&profile, &CancellationToken::new())
            .await;

        result.assert_status(OverallStatus::Unhealthy);
        result.assert_protocol_error(ErrorType::Parsing);
        let protocol = result.protocol.unwrap();
        assert!(protocol.reachable);
        assert_eq!(protocol.protocol_error.unwrap().message, "Method not found");
    }

    #[tokio::test]
    async fn test_slow_status_endpoint_times_out() {
        let server = McpServer::start().await;
        server.with_slow_status(Duration::from_secs(2)).await;

        let profile = ProfileFactory::endpoint_only("slow", &server)
            .with_timeout(Duration::from_millis(100))
            .with_retry(ProfileFactory::fast_retry(1));
        let client = Arc::new(ResilientClient::new());
        let result = DualCheckOrchestrator::new(client.clone(), DualCheckConfig::default())
            .check_server(&profile, &CancellationToken::new())
            .await;

        result.assert_status(OverallStatus::Unhealthy);
        result.assert_endpoint_error(ErrorType::Timeout);
        assert!(!result.reachable());
        assert_eq!(client.stats("slow").unwrap().retries, 1);
    }

    #[tokio::test]
    async fn test_connection_refused_is_connection_error() {
        let profile = ProfileFactory::unreachable("gone");

        let result = orchestrator(DualCheckConfig::default())
            .check_server(&profile, &CancellationToken::new())
            .await;

        result.assert_status(OverallStatus::Unhealthy);
        result.assert_protocol_error(ErrorType::Connection);
        result.assert_endpoint_error(ErrorType::Connection);
        assert!(result.available_paths.is_empty());
    }

    #[tokio::test]
    async fn test_shutdown_interrupts_slow_probe() {
        let server = McpServer::start().await;
        server.with_slow_status(Duration::from_secs(5)).await;

        let profile =
            ProfileFactory::endpoint_only("slow", &server).with_timeout(Duration::from_secs(10));
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let started = std::time::Instant::now();
        let result = orchestrator(DualCheckConfig::default())
            .check_server(&profile, &cancel)
            .await;

        assert!(result.is_cancelled());
        result.assert_endpoint_error(ErrorType::Cancelled);
        assert!(started.elapsed() < Duration::from_secs(2));
    }
}
