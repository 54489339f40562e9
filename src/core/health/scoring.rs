//! Combining probe outcomes into one verdict

use super::types::{CheckPath, OverallStatus};
use crate::config::models::{DualCheckConfig, MissingToolsPolicy};
use crate::core::mcp::ToolMatch;

/// What the scorer needs from one enabled probe
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathOutcome {
    pub success: bool,
    /// Numeric success in [0, 1]; 1.0 exactly when `success`
    pub credit: f64,
}

impl PathOutcome {
    pub fn passed() -> Self {
        Self {
            success: true,
            credit: 1.0,
        }
    }

    pub fn failed() -> Self {
        Self {
            success: false,
            credit: 0.0,
        }
    }
}

/// Derived fields of a dual check result
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub overall_status: OverallStatus,
    pub overall_success: bool,
    pub health_score: f64,
    pub available_paths: Vec<CheckPath>,
}

impl Verdict {
    fn unknown() -> Self {
        Self {
            overall_status: OverallStatus::Unknown,
            overall_success: false,
            health_score: 0.0,
            available_paths: Vec::new(),
        }
    }
}

/// Credit for a tools list that came back well-formed
pub fn tools_credit(config: &DualCheckConfig, matched: &ToolMatch) -> f64 {
    if !config.expected_tools_validation || matched.is_complete() {
        return 1.0;
    }
    match config.missing_tools_policy {
        MissingToolsPolicy::Fail => 0.0,
        MissingToolsPolicy::PartialCredit => matched.ratio(),
    }
}

/// Score and classify the enabled probes; `None` means disabled or no data.
///
/// An empty `available_paths` is always UNHEALTHY and a non-empty one never
/// is, whatever the thresholds say.
pub fn evaluate(
    config: &DualCheckConfig,
    protocol: Option<PathOutcome>,
    endpoint: Option<PathOutcome>,
) -> Verdict {
    let paths: Vec<(CheckPath, PathOutcome, f64)> = match (protocol, endpoint) {
        (None, None) => return Verdict::unknown(),
        (Some(p), Some(e)) => vec![
            (CheckPath::Protocol, p, config.weight_protocol),
            (CheckPath::Endpoint, e, config.weight_endpoint),
        ],
        (Some(p), None) => vec![(CheckPath::Protocol, p, 1.0)],
        (None, Some(e)) => vec![(CheckPath::Endpoint, e, 1.0)],
    };

    let available_paths: Vec<CheckPath> = paths
        .iter()
        .filter(|(_, outcome, _)| outcome.success)
        .map(|(path, _, _)| *path)
        .collect();
    let all_passed = available_paths.len() == paths.len();

    let overall_success = if config.require_both_success_for_healthy {
        all_passed
    } else {
        !available_paths.is_empty()
    };

    let health_score = if all_passed {
        1.0
    } else {
        let total: f64 = paths
            .iter()
            .map(|(_, outcome, weight)| weight * outcome.credit.clamp(0.0, 1.0))
            .sum();
        total.clamp(0.0, 1.0)
    };

    let overall_status = if available_paths.is_empty() {
        OverallStatus::Unhealthy
    } else {
        let by_threshold = if health_score >= config.degraded_threshold {
            OverallStatus::Healthy
        } else {
            OverallStatus::Degraded
        };
        let single_failure = paths.len() == 2 && available_paths.len() == 1;
        if single_failure && config.degraded_on_single_failure {
            OverallStatus::Degraded
        } else {
            by_threshold
        }
    };

    Verdict {
        overall_status,
        overall_success,
        health_score,
        available_paths,
    }
}
