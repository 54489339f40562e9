//! Test fixtures and data factories
//!
//! Profiles here use short timeouts and no backoff so suites stay fast.

use super::McpServer;
use std::time::Duration;
use toolgate_rs::config::models::{AlertConfig, GlobalDefaults, MonitorConfig, ServerProfile};
use toolgate_rs::utils::error::recovery::{CircuitBreakerConfig, RetryConfig};

/// Factory for server profiles pointing at an [`McpServer`]
pub struct ProfileFactory;

impl ProfileFactory {
    /// Both probes enabled, no retries, breaker trips after 5 failures
    pub fn dual(name: &str, server: &McpServer) -> ServerProfile {
        ServerProfile::new(name)
            .with_protocol_url(server.protocol_url())
            .with_status_url(server.status_url())
            .with_timeout(Duration::from_secs(2))
            .with_check_interval(Duration::from_millis(25))
            .with_retry(RetryConfig::no_retries())
            .with_circuit_breaker(CircuitBreakerConfig::new(5, Duration::from_secs(60)))
    }

    /// Both probes pointed at a port nothing listens on
    pub fn unreachable(name: &str) -> ServerProfile {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        ServerProfile::new(name)
            .with_protocol_url(format!("http://{}/mcp", addr))
            .with_status_url(format!("http://{}/status", addr))
            .with_timeout(Duration::from_secs(2))
            .with_retry(RetryConfig::no_retries())
            .with_circuit_breaker(CircuitBreakerConfig::new(5, Duration::from_secs(60)))
    }

    pub fn protocol_only(name: &str, server: &McpServer) -> ServerProfile {
        let mut profile = Self::dual(name, server);
        profile.status_url = None;
        profile
    }

    pub fn endpoint_only(name: &str, server: &McpServer) -> ServerProfile {
        let mut profile = Self::dual(name, server);
        profile.protocol_url = None;
        profile
    }

    /// Retry policy with `max_retries` and millisecond backoff
    pub fn fast_retry(max_retries: u32) -> RetryConfig {
        RetryConfig {
            max_retries,
            base_delay_ms: 1,
            max_delay_ms: 5,
            jitter: false,
            ..RetryConfig::default()
        }
    }
}

/// Monitor config with a short retirement grace and quiet alert logging
pub fn monitor_config(servers: Vec<ServerProfile>) -> MonitorConfig {
    MonitorConfig {
        defaults: GlobalDefaults {
            retirement_grace_ms: 50,
            ..GlobalDefaults::default()
        },
        alerts: AlertConfig {
            log_events: false,
            ..AlertConfig::default()
        },
        servers,
        ..MonitorConfig::default()
    }
}
