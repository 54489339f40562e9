//! Check error taxonomy and classification
//!
//! Every failure on a probe path is reduced to a [`FailureSignal`] made of a
//! few structural cues and then classified into a closed [`CheckError`].

use crate::utils::error::recovery::CircuitOpenError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Classified error kind, used as the key for per-server error counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ErrorType {
    #[serde(rename = "connection_error")]
    Connection,
    #[serde(rename = "timeout_error")]
    Timeout,
    #[serde(rename = "authentication_error")]
    Authentication,
    #[serde(rename = "parsing_error")]
    Parsing,
    #[serde(rename = "service_error")]
    Service,
    #[serde(rename = "circuit_open_error")]
    CircuitOpen,
    #[serde(rename = "cancelled")]
    Cancelled,
}

impl ErrorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorType::Connection => "connection_error",
            ErrorType::Timeout => "timeout_error",
            ErrorType::Authentication => "authentication_error",
            ErrorType::Parsing => "parsing_error",
            ErrorType::Service => "service_error",
            ErrorType::CircuitOpen => "circuit_open_error",
            ErrorType::Cancelled => "cancelled",
        }
    }

    /// Kinds that may clear up on their own and are therefore eligible for retry
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ErrorType::Connection | ErrorType::Timeout | ErrorType::Service
        )
    }
}

impl std::fmt::Display for ErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error surfaced by a single probe operation
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CheckError {
    /// Transport refused or reset
    #[error("connection error: {message}")]
    Connection { message: String },

    /// Deadline exceeded
    #[error("timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// Credential rejected
    #[error("authentication rejected{}: {message}", status.map(|s| format!(" (HTTP {})", s)).unwrap_or_default())]
    Authentication { status: Option<u16>, message: String },

    /// Malformed or unexpected response shape
    #[error("unexpected response: {message}")]
    Parsing { message: String },

    /// Remote returned a well-formed failure
    #[error("service error: {message}")]
    Service {
        status: Option<u16>,
        code: Option<i32>,
        message: String,
    },

    /// Breaker rejected the call before any I/O
    #[error(transparent)]
    CircuitOpen(CircuitOpenError),

    /// Shutdown cancelled the check
    #[error("check cancelled")]
    Cancelled,
}

impl CheckError {
    pub fn kind(&self) -> ErrorType {
        match self {
            CheckError::Connection { .. } => ErrorType::Connection,
            CheckError::Timeout { .. } => ErrorType::Timeout,
            CheckError::Authentication { .. } => ErrorType::Authentication,
            CheckError::Parsing { .. } => ErrorType::Parsing,
            CheckError::Service { .. } => ErrorType::Service,
            CheckError::CircuitOpen(_) => ErrorType::CircuitOpen,
            CheckError::Cancelled => ErrorType::Cancelled,
        }
    }

    /// HTTP status attached to the failure, if any
    pub fn status_code(&self) -> Option<u16> {
        match self {
            CheckError::Authentication { status, .. } | CheckError::Service { status, .. } => {
                *status
            }
            _ => None,
        }
    }

    /// JSON-RPC error code attached to the failure, if any
    pub fn rpc_code(&self) -> Option<i32> {
        match self {
            CheckError::Service { code, .. } => *code,
            _ => None,
        }
    }

    pub fn parsing(message: impl Into<String>) -> Self {
        CheckError::Parsing {
            message: message.into(),
        }
    }
}

impl From<CircuitOpenError> for CheckError {
    fn from(err: CircuitOpenError) -> Self {
        CheckError::CircuitOpen(err)
    }
}

impl From<reqwest::Error> for CheckError {
    fn from(err: reqwest::Error) -> Self {
        classify(FailureSignal::from(&err))
    }
}

/// Structural cues extracted from a raw failure
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FailureSignal {
    pub timed_out: bool,
    pub connect_failed: bool,
    pub malformed: bool,
    pub status: Option<u16>,
    pub rpc_code: Option<i32>,
    pub timeout_ms: Option<u64>,
    pub message: String,
}

impl FailureSignal {
    pub fn timeout(timeout_ms: u64) -> Self {
        Self {
            timed_out: true,
            timeout_ms: Some(timeout_ms),
            message: format!("deadline of {}ms exceeded", timeout_ms),
            ..Self::default()
        }
    }

    pub fn connect(message: impl Into<String>) -> Self {
        Self {
            connect_failed: true,
            message: message.into(),
            ..Self::default()
        }
    }

    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
            ..Self::default()
        }
    }

    pub fn rpc(code: i32, message: impl Into<String>) -> Self {
        Self {
            rpc_code: Some(code),
            message: message.into(),
            ..Self::default()
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self {
            malformed: true,
            message: message.into(),
            ..Self::default()
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }
}

impl From<&reqwest::Error> for FailureSignal {
    fn from(err: &reqwest::Error) -> Self {
        Self {
            timed_out: err.is_timeout(),
            connect_failed: err.is_connect(),
            malformed: err.is_decode(),
            status: err.status().map(|s| s.as_u16()),
            rpc_code: None,
            timeout_ms: None,
            message: err.to_string(),
        }
    }
}

// JSON-RPC codes that indicate the peer does not speak the expected contract.
const RPC_PARSE_ERROR: i32 = -32700;
const RPC_INVALID_REQUEST: i32 = -32600;
const RPC_METHOD_NOT_FOUND: i32 = -32601;
const RPC_INVALID_PARAMS: i32 = -32602;

/// Map a failure signal onto the taxonomy; anything unrecognised is a service error
pub fn classify(signal: FailureSignal) -> CheckError {
    if signal.timed_out {
        return CheckError::Timeout {
            timeout_ms: signal.timeout_ms.unwrap_or(0),
        };
    }
    if signal.connect_failed {
        return CheckError::Connection {
            message: signal.message,
        };
    }
    if let Some(status) = signal.status {
        return match status {
            401 | 403 => CheckError::Authentication {
                status: Some(status),
                message: signal.message,
            },
            408 | 504 => CheckError::Timeout {
                timeout_ms: signal.timeout_ms.unwrap_or(0),
            },
            _ => CheckError::Service {
                status: Some(status),
                code: signal.rpc_code,
                message: signal.message,
            },
        };
    }
    if let Some(code) = signal.rpc_code {
        return match code {
            RPC_PARSE_ERROR | RPC_INVALID_REQUEST | RPC_METHOD_NOT_FOUND | RPC_INVALID_PARAMS => {
                CheckError::Parsing {
                    message: format!("[{}] {}", code, signal.message),
                }
            }
            _ => CheckError::Service {
                status: None,
                code: Some(code),
                message: signal.message,
            },
        };
    }
    if signal.malformed {
        return CheckError::Parsing {
            message: signal.message,
        };
    }
    CheckError::Service {
        status: None,
        code: None,
        message: signal.message,
    }
}
