//! Probe transports
//!
//! The checkers talk to servers only through these traits, so tests and
//! embedders can substitute the wire. [`HttpTransport`] is the reqwest
//! implementation used in production.

use super::credentials::HeaderSet;
use crate::config::models::ServerProfile;
use crate::core::client::{CheckError, FailureSignal, classify};
use crate::core::mcp::{JsonRpcRequest, JsonRpcResponse};
use crate::utils::net::get_client_with_timeout;
use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

/// Raw reply from a status endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct StatusResponse {
    pub status: u16,
    /// Body parsed as JSON, `None` when it is not JSON
    pub body: Option<Value>,
}

/// Sends one JSON-RPC request to a server's protocol endpoint
#[async_trait]
pub trait ProtocolTransport: Send + Sync + std::fmt::Debug {
    async fn send(
        &self,
        profile: &ServerProfile,
        headers: &HeaderSet,
        request: &JsonRpcRequest,
    ) -> Result<JsonRpcResponse, CheckError>;
}

/// Fetches a server's status endpoint.
///
/// Any HTTP status is returned as `Ok`; judging it is the checker's job.
#[async_trait]
pub trait EndpointTransport: Send + Sync + std::fmt::Debug {
    async fn fetch(
        &self,
        profile: &ServerProfile,
        headers: &HeaderSet,
    ) -> Result<StatusResponse, CheckError>;
}

/// reqwest-backed transport for both probes
#[derive(Debug, Default, Clone, Copy)]
pub struct HttpTransport;

fn transport_error(profile: &ServerProfile, err: reqwest::Error) -> CheckError {
    let signal = FailureSignal {
        timeout_ms: Some(profile.timeout().as_millis() as u64),
        ..FailureSignal::from(&err)
    };
    classify(signal)
}

fn missing_url(profile: &ServerProfile, what: &str) -> CheckError {
    CheckError::Connection {
        message: format!("server '{}' has no {} configured", profile.name, what),
    }
}

#[async_trait]
impl ProtocolTransport for HttpTransport {
    async fn send(
        &self,
        profile: &ServerProfile,
        headers: &HeaderSet,
        request: &JsonRpcRequest,
    ) -> Result<JsonRpcResponse, CheckError> {
        let url = profile
            .protocol_url
            .as_deref()
            .ok_or_else(|| missing_url(profile, "protocol_url"))?;
        let client = get_client_with_timeout(profile.timeout());

        let mut builder = client.post(url).json(request);
        for (name, value) in headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| transport_error(profile, e))?;
        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| transport_error(profile, e))?;

        if !status.is_success() {
            let rpc_code = serde_json::from_slice::<JsonRpcResponse>(&bytes)
                .ok()
                .and_then(|r| r.error)
                .map(|e| e.code);
            debug!(server = %profile.name, status = status.as_u16(), "protocol endpoint returned error status");
            return Err(classify(FailureSignal {
                rpc_code,
                ..FailureSignal::status(
                    status.as_u16(),
                    format!("tools/list returned HTTP {}", status.as_u16()),
                )
            }));
        }

        serde_json::from_slice(&bytes)
            .map_err(|e| CheckError::parsing(format!("invalid JSON-RPC response: {}", e)))
    }
}

#[async_trait]
impl EndpointTransport for HttpTransport {
    async fn fetch(
        &self,
        profile: &ServerProfile,
        headers: &HeaderSet,
    ) -> Result<StatusResponse, CheckError> {
        let url = profile
            .status_url
            .as_deref()
            .ok_or_else(|| missing_url(profile, "status_url"))?;
        let client = get_client_with_timeout(profile.timeout());

        let mut builder = client.get(url);
        for (name, value) in headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| transport_error(profile, e))?;
        let status = response.status().as_u16();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| transport_error(profile, e))?;

        Ok(StatusResponse {
            status,
            body: serde_json::from_slice(&bytes).ok(),
        })
    }
}
