//! Configuration models
//!
//! Plain serde structures deserialized from the monitor's YAML file. Every
//! field has a default so a minimal file only needs to list servers.

pub mod auth;
pub mod monitoring;
pub mod scoring;
pub mod server;

pub use auth::*;
pub use monitoring::*;
pub use scoring::*;
pub use server::*;

/// Default per-attempt probe timeout in milliseconds
pub fn default_timeout_ms() -> u64 {
    10_000
}

/// Default interval between check cycles in milliseconds
pub fn default_check_interval_ms() -> u64 {
    30_000
}

/// Grace period before a removed server's state is dropped
pub fn default_retirement_grace_ms() -> u64 {
    300_000
}

pub fn default_retention_secs() -> u64 {
    86_400
}

pub fn default_max_records_per_server() -> usize {
    10_000
}

pub fn default_histogram_top_n() -> usize {
    10
}

pub fn default_alert_history_size() -> usize {
    1000
}

pub fn default_weight_protocol() -> f64 {
    0.6
}

pub fn default_weight_endpoint() -> f64 {
    0.4
}

pub fn default_failure_threshold() -> f64 {
    0.3
}

pub fn default_degraded_threshold() -> f64 {
    0.7
}

pub fn default_max_tool_pages() -> u32 {
    10
}

pub fn default_true() -> bool {
    true
}
