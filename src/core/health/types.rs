//! Health status types and check results
//!
//! Results are created once per check cycle and never mutated afterwards;
//! consumers receive clones.

use crate::core::client::{CheckError, ErrorType};
use crate::core::mcp::JsonRpcError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Combined verdict for one server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OverallStatus {
    /// Score at or above the degraded threshold
    Healthy,
    /// At least one path works but the score is reduced
    Degraded,
    /// No path works
    Unhealthy,
    /// No probe enabled or no data
    Unknown,
}

impl OverallStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OverallStatus::Healthy => "HEALTHY",
            OverallStatus::Degraded => "DEGRADED",
            OverallStatus::Unhealthy => "UNHEALTHY",
            OverallStatus::Unknown => "UNKNOWN",
        }
    }

    /// Check if the status allows routing requests to the server
    pub fn allows_requests(&self) -> bool {
        matches!(self, OverallStatus::Healthy | OverallStatus::Degraded)
    }
}

impl std::fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One of the two probe paths
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckPath {
    Protocol,
    Endpoint,
}

impl CheckPath {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckPath::Protocol => "protocol",
            CheckPath::Endpoint => "endpoint",
        }
    }
}

/// Outcome of the tools/list probe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtocolCheckResult {
    pub server_name: String,
    pub timestamp: DateTime<Utc>,
    /// Tools listed and every expected tool present
    pub success: bool,
    /// A well-formed JSON-RPC response came back, whatever its content
    pub reachable: bool,
    pub response_time_ms: f64,
    pub tool_count: usize,
    #[serde(default)]
    pub tool_names: Vec<String>,
    #[serde(default)]
    pub found_tools: Vec<String>,
    #[serde(default)]
    pub missing_tools: Vec<String>,
    /// Score contribution in [0, 1] before weighting
    pub credit: f64,
    /// Classified failure, if the probe did not complete
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<CheckError>,
    /// Error object returned by the server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol_error: Option<JsonRpcError>,
    /// Correlation id sent as the JSON-RPC request id
    pub correlation_id: String,
}

impl ProtocolCheckResult {
    pub fn error_type(&self) -> Option<ErrorType> {
        self.error.as_ref().map(CheckError::kind)
    }

    pub fn is_cancelled(&self) -> bool {
        self.error_type() == Some(ErrorType::Cancelled)
    }
}

/// Outcome of the status endpoint probe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointCheckResult {
    pub server_name: String,
    pub timestamp: DateTime<Utc>,
    pub success: bool,
    /// Any HTTP status was received
    pub reachable: bool,
    pub response_time_ms: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    /// Parsed JSON object body, when the body was one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Map<String, Value>>,
    /// Classified failure, if the probe did not succeed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<CheckError>,
    /// Why an HTTP response that did arrive was rejected
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_error: Option<String>,
}

impl EndpointCheckResult {
    pub fn error_type(&self) -> Option<ErrorType> {
        self.error.as_ref().map(CheckError::kind)
    }

    pub fn is_cancelled(&self) -> bool {
        self.error_type() == Some(ErrorType::Cancelled)
    }
}

/// Combined result of one check cycle for one server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DualCheckResult {
    pub server_name: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<ProtocolCheckResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<EndpointCheckResult>,
    pub overall_status: OverallStatus,
    pub overall_success: bool,
    /// Mean of the available probe latencies
    pub combined_response_time_ms: f64,
    pub health_score: f64,
    pub available_paths: Vec<CheckPath>,
}

impl DualCheckResult {
    /// Whether shutdown interrupted any probe of this cycle
    pub fn is_cancelled(&self) -> bool {
        self.protocol.as_ref().is_some_and(|p| p.is_cancelled())
            || self.endpoint.as_ref().is_some_and(|e| e.is_cancelled())
    }

    pub fn path_available(&self, path: CheckPath) -> bool {
        self.available_paths.contains(&path)
    }

    /// Any enabled path produced a response, successful or not
    pub fn reachable(&self) -> bool {
        self.protocol.as_ref().is_some_and(|p| p.reachable)
            || self.endpoint.as_ref().is_some_and(|e| e.reachable)
    }
}
