//! Shared HTTP clients for probe requests
//!
//! Probes to many servers reuse pooled clients instead of building one per
//! request. Clients are cached by timeout, since reqwest fixes the request
//! timeout at build time.

use dashmap::DashMap;
use reqwest::{Client, ClientBuilder};
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tracing::{debug, warn};

/// Configuration for the HTTP client pool
#[derive(Debug, Clone)]
pub struct HttpClientPoolConfig {
    /// Maximum idle connections per host
    pub pool_max_idle_per_host: usize,
    /// Idle connection timeout
    pub pool_idle_timeout: Duration,
    /// Upper bound on connection setup, further capped by the request timeout
    pub connect_timeout: Duration,
    /// TCP keepalive interval
    pub tcp_keepalive: Duration,
    /// User agent string
    pub user_agent: &'static str,
}

impl Default for HttpClientPoolConfig {
    fn default() -> Self {
        Self {
            pool_max_idle_per_host: 8,
            pool_idle_timeout: Duration::from_secs(90),
            connect_timeout: Duration::from_secs(10),
            tcp_keepalive: Duration::from_secs(60),
            user_agent: concat!("toolgate-monitor/", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Timeout-specific client cache, keyed by milliseconds
static TIMEOUT_CLIENT_CACHE: OnceLock<DashMap<u64, Arc<Client>>> = OnceLock::new();

/// Get or create a client with a specific timeout
pub fn get_client_with_timeout(timeout: Duration) -> Arc<Client> {
    let cache = TIMEOUT_CLIENT_CACHE.get_or_init(DashMap::new);
    let timeout_ms = timeout.as_millis() as u64;

    cache
        .entry(timeout_ms)
        .or_insert_with(|| {
            debug!(timeout_ms, "Creating cached HTTP client for timeout");
            Arc::new(create_probe_client(timeout))
        })
        .clone()
}

fn create_probe_client(timeout: Duration) -> Client {
    let config = HttpClientPoolConfig::default();

    ClientBuilder::new()
        .pool_max_idle_per_host(config.pool_max_idle_per_host)
        .pool_idle_timeout(config.pool_idle_timeout)
        .timeout(timeout)
        .connect_timeout(config.connect_timeout.min(timeout))
        .tcp_keepalive(config.tcp_keepalive)
        .tcp_nodelay(true)
        .user_agent(config.user_agent)
        // Probes measure the server itself, never an intermediary.
        .no_proxy()
        .build()
        .unwrap_or_else(|e| {
            warn!(
                "Failed to create probe HTTP client, falling back to default: {}",
                e
            );
            Client::new()
        })
}
