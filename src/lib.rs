//! # toolgate-rs
//!
//! Resilient health monitoring for fleets of MCP tool servers.
//!
//! ## Features
//!
//! - **Dual-path checks**: `tools/list` over JSON-RPC and a plain HTTP status endpoint, scored together
//! - **Circuit breaking**: one breaker per server, shared by both paths
//! - **Retries**: exponential backoff with jitter, only for retryable error classes
//! - **Windowed metrics**: per-server history with percentiles, histograms and export/import
//! - **Alerts**: status transitions and breaker trips delivered to pluggable sinks
//! - **Live reconfiguration**: swap the server set without restarting
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use toolgate_rs::{Config, HealthMonitor};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_file("config/toolgate.yaml").await?;
//!     let monitor = HealthMonitor::new(config.monitor)?;
//!
//!     for result in monitor.check_all_now().await {
//!         println!("{}: {} ({:.2})", result.server_name, result.overall_status, result.health_score);
//!     }
//!     Ok(())
//! }
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_inception)]

pub mod config;
pub mod core;
pub mod monitoring;
pub mod utils;

// Re-export main types
pub use config::{Config, MonitorConfig, ServerProfile};
pub use utils::error::{MonitorError, Result};

pub use core::client::{CheckError, ConnectionStats, ErrorType, ResilientClient};
pub use core::health::{
    CheckPath, DualCheckOrchestrator, DualCheckResult, EndpointCheckResult, OverallStatus,
    ProtocolCheckResult,
};
pub use monitoring::{
    AggregationReport, AlertEvent, AlertSink, HealthMonitor, MetricsCollector, MetricsSummary,
    TimeWindow,
};

// Version information
/// Current version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Name of the crate
pub const NAME: &str = env!("CARGO_PKG_NAME");
/// Description of the crate
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Monitor build information
#[derive(Debug, Clone, serde::Serialize)]
pub struct BuildInfo {
    pub version: &'static str,
    /// Seconds since the epoch at build time
    pub build_time: &'static str,
    /// Git commit hash
    pub git_hash: &'static str,
    pub rust_version: &'static str,
}

impl Default for BuildInfo {
    fn default() -> Self {
        Self {
            version: VERSION,
            build_time: option_env!("BUILD_TIME").unwrap_or("unknown"),
            git_hash: option_env!("GIT_HASH").unwrap_or("unknown"),
            rust_version: option_env!("RUST_VERSION").unwrap_or("unknown"),
        }
    }
}

pub fn build_info() -> BuildInfo {
    BuildInfo::default()
}
