//! Dual-protocol health checking
//!
//! - `types` - statuses and per-probe results
//! - `scoring` - weighted score and status rules
//! - `protocol` - MCP tools/list probe
//! - `endpoint` - HTTP status endpoint probe
//! - `dual` - runs both probes and combines them
//! - `transport` / `credentials` - wire and auth seams

pub mod credentials;
pub mod dual;
pub mod endpoint;
pub mod protocol;
pub mod scoring;
pub mod transport;
pub mod types;

pub use credentials::{CredentialProvider, HeaderSet, StaticCredentials};
pub use dual::DualCheckOrchestrator;
pub use endpoint::{EndpointChecker, has_health_indicator};
pub use protocol::ProtocolChecker;
pub use scoring::{PathOutcome, Verdict, evaluate, tools_credit};
pub use transport::{EndpointTransport, HttpTransport, ProtocolTransport, StatusResponse};
pub use types::{
    CheckPath, DualCheckResult, EndpointCheckResult, OverallStatus, ProtocolCheckResult,
};
