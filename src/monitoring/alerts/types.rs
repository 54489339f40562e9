//! Alert types and data structures

use crate::core::health::OverallStatus;
use crate::utils::error::recovery::CircuitBreakerRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};

/// Alert severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Info,
    Warning,
    Critical,
}

impl std::fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertSeverity::Info => write!(f, "INFO"),
            AlertSeverity::Warning => write!(f, "WARNING"),
            AlertSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// What happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    StatusChanged,
    CircuitOpened,
    CircuitRecovered,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::StatusChanged => "status_changed",
            AlertKind::CircuitOpened => "circuit_opened",
            AlertKind::CircuitRecovered => "circuit_recovered",
        }
    }
}

/// One alert-worthy event for one server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEvent {
    pub id: String,
    pub kind: AlertKind,
    pub severity: AlertSeverity,
    pub server_name: String,
    pub timestamp: DateTime<Utc>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_status: Option<OverallStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_status: Option<OverallStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub breaker: Option<CircuitBreakerRecord>,
}

impl AlertEvent {
    fn new(kind: AlertKind, severity: AlertSeverity, server_name: &str, message: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            severity,
            server_name: server_name.to_string(),
            timestamp: Utc::now(),
            message,
            previous_status: None,
            current_status: None,
            health_score: None,
            breaker: None,
        }
    }

    pub fn status_changed(
        server_name: &str,
        previous: OverallStatus,
        current: OverallStatus,
        health_score: f64,
    ) -> Self {
        let severity = match current {
            OverallStatus::Healthy => AlertSeverity::Info,
            OverallStatus::Degraded | OverallStatus::Unknown => AlertSeverity::Warning,
            OverallStatus::Unhealthy => AlertSeverity::Critical,
        };
        let message = format!(
            "server '{}' went from {} to {} (score {:.2})",
            server_name, previous, current, health_score
        );
        Self {
            previous_status: Some(previous),
            current_status: Some(current),
            health_score: Some(health_score),
            ..Self::new(AlertKind::StatusChanged, severity, server_name, message)
        }
    }

    pub fn circuit_opened(record: CircuitBreakerRecord) -> Self {
        let message = format!(
            "circuit opened for server '{}' after {} consecutive failures",
            record.server_name, record.consecutive_failures
        );
        Self {
            breaker: Some(record.clone()),
            ..Self::new(
                AlertKind::CircuitOpened,
                AlertSeverity::Critical,
                &record.server_name,
                message,
            )
        }
    }

    pub fn circuit_recovered(record: CircuitBreakerRecord) -> Self {
        let message = format!("circuit closed again for server '{}'", record.server_name);
        Self {
            breaker: Some(record.clone()),
            ..Self::new(
                AlertKind::CircuitRecovered,
                AlertSeverity::Info,
                &record.server_name,
                message,
            )
        }
    }
}

/// Consolidated alert storage - single lock for related data
#[derive(Debug, Default)]
pub(super) struct AlertStorage {
    pub history: VecDeque<AlertEvent>,
    pub stats: AlertStats,
}

/// Alert statistics
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertStats {
    pub total_alerts: u64,
    pub alerts_by_kind: BTreeMap<String, u64>,
    pub alerts_by_severity: BTreeMap<String, u64>,
    pub failed_deliveries: u64,
    pub last_alert: Option<DateTime<Utc>>,
}
