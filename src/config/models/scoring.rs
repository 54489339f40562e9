//! Dual check scoring configuration

use super::*;
use serde::{Deserialize, Serialize};

/// How a tools list that lacks expected tools is scored
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingToolsPolicy {
    /// Any missing tool scores the protocol path as 0.0
    Fail,
    /// Score found/expected
    #[default]
    PartialCredit,
}

/// Weights, thresholds and probe options for combining two probes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DualCheckConfig {
    #[serde(default = "default_weight_protocol")]
    pub weight_protocol: f64,
    #[serde(default = "default_weight_endpoint")]
    pub weight_endpoint: f64,
    /// Scores below this are UNHEALTHY
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: f64,
    /// Scores at or above this are HEALTHY
    #[serde(default = "default_degraded_threshold")]
    pub degraded_threshold: f64,
    /// AND instead of OR when computing `overall_success`
    #[serde(default)]
    pub require_both_success_for_healthy: bool,
    /// Cap a result with exactly one failed path at DEGRADED
    #[serde(default = "default_true")]
    pub degraded_on_single_failure: bool,
    /// Check expected tool names in the protocol probe
    #[serde(default = "default_true")]
    pub expected_tools_validation: bool,
    #[serde(default)]
    pub missing_tools_policy: MissingToolsPolicy,
    /// Upper bound on tools/list pages followed per check
    #[serde(default = "default_max_tool_pages")]
    pub max_tool_pages: u32,
}

impl Default for DualCheckConfig {
    fn default() -> Self {
        Self {
            weight_protocol: default_weight_protocol(),
            weight_endpoint: default_weight_endpoint(),
            failure_threshold: default_failure_threshold(),
            degraded_threshold: default_degraded_threshold(),
            require_both_success_for_healthy: false,
            degraded_on_single_failure: true,
            expected_tools_validation: true,
            missing_tools_policy: MissingToolsPolicy::default(),
            max_tool_pages: default_max_tool_pages(),
        }
    }
}
