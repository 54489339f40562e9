//! MCP tools/list probe

use super::credentials::{CredentialProvider, StaticCredentials};
use super::scoring::tools_credit;
use super::transport::{HttpTransport, ProtocolTransport};
use super::types::ProtocolCheckResult;
use crate::config::models::{DualCheckConfig, ServerProfile};
use crate::core::client::{CheckError, ResilientClient};
use crate::core::mcp::{JsonRpcError, JsonRpcRequest, ListToolsResult, Tool, ToolMatch, methods};
use crate::utils::generate_request_id;
use chrono::Utc;
use parking_lot::Mutex;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// What the last attempt saw on the wire
#[derive(Debug, Default)]
struct Observed {
    reachable: bool,
    protocol_error: Option<JsonRpcError>,
}

/// Lists a server's tools over JSON-RPC and checks the expected ones are there
#[derive(Debug, Clone)]
pub struct ProtocolChecker {
    transport: Arc<dyn ProtocolTransport>,
    credentials: Arc<dyn CredentialProvider>,
}

impl Default for ProtocolChecker {
    fn default() -> Self {
        Self::new(Arc::new(HttpTransport), Arc::new(StaticCredentials))
    }
}

impl ProtocolChecker {
    pub fn new(
        transport: Arc<dyn ProtocolTransport>,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Self {
        Self {
            transport,
            credentials,
        }
    }

    /// Probe `profile` through `client`, retrying per the profile's policy
    pub async fn check(
        &self,
        client: &ResilientClient,
        profile: &ServerProfile,
        scoring: &DualCheckConfig,
        cancel: &CancellationToken,
    ) -> ProtocolCheckResult {
        let correlation_id = generate_request_id();
        let observed = Mutex::new(Observed::default());
        let seen = &observed;
        let request_id = correlation_id.as_str();
        let max_pages = scoring.max_tool_pages;
        let started = Instant::now();

        let outcome = client
            .execute(profile, cancel, move |attempt| {
                self.list_tools(profile, max_pages, request_id, attempt, seen)
            })
            .await;

        let response_time_ms = started.elapsed().as_secs_f64() * 1000.0;
        let observed = observed.into_inner();
        let mut result = ProtocolCheckResult {
            server_name: profile.name.clone(),
            timestamp: Utc::now(),
            success: false,
            reachable: observed.reachable,
            response_time_ms,
            tool_count: 0,
            tool_names: Vec::new(),
            found_tools: Vec::new(),
            missing_tools: Vec::new(),
            credit: 0.0,
            error: None,
            protocol_error: observed.protocol_error,
            correlation_id,
        };

        match outcome {
            Ok(tools) => {
                let matched = ToolMatch::compute(&tools, &profile.expected_tools);
                result.credit = tools_credit(scoring, &matched);
                result.success = !scoring.expected_tools_validation || matched.is_complete();
                result.tool_count = tools.len();
                result.tool_names = tools.into_iter().map(|t| t.name).collect();
                if !matched.missing.is_empty() {
                    debug!(server = %profile.name, missing = ?matched.missing, "expected tools missing");
                }
                result.found_tools = matched.found;
                result.missing_tools = matched.missing;
            }
            Err(error) => {
                if error.status_code().is_some() {
                    result.reachable = true;
                }
                result.error = Some(error);
            }
        }
        result
    }

    /// A tools/list result for a probe that never ran
    pub fn not_run(profile: &ServerProfile, error: CheckError) -> ProtocolCheckResult {
        ProtocolCheckResult {
            server_name: profile.name.clone(),
            timestamp: Utc::now(),
            success: false,
            reachable: false,
            response_time_ms: 0.0,
            tool_count: 0,
            tool_names: Vec::new(),
            found_tools: Vec::new(),
            missing_tools: Vec::new(),
            credit: 0.0,
            error: Some(error),
            protocol_error: None,
            correlation_id: generate_request_id(),
        }
    }

    /// One attempt: walk every page of tools/list
    async fn list_tools(
        &self,
        profile: &ServerProfile,
        max_pages: u32,
        correlation_id: &str,
        attempt: u32,
        observed: &Mutex<Observed>,
    ) -> Result<Vec<Tool>, CheckError> {
        *observed.lock() = Observed::default();
        let headers = self.credentials.headers(profile).await?;
        let mut tools = Vec::new();
        let mut cursor: Option<String> = None;

        for page in 0..max_pages {
            let id = if page == 0 {
                Value::String(correlation_id.to_string())
            } else {
                Value::String(format!("{}:{}", correlation_id, page))
            };
            let params = cursor.as_ref().map(|c| json!({ "cursor": c }));
            let request = JsonRpcRequest::new(methods::LIST_TOOLS, params, id.clone());

            let response = self.transport.send(profile, &headers, &request).await?;
            {
                let mut seen = observed.lock();
                seen.reachable = true;
                seen.protocol_error = response.error.clone();
            }

            let value = response.into_result(&id)?;
            let listed: ListToolsResult = serde_json::from_value(value)
                .map_err(|e| CheckError::parsing(format!("invalid tools/list result: {}", e)))?;
            tools.extend(listed.tools);

            match listed.next_cursor.filter(|c| !c.is_empty()) {
                None => return Ok(tools),
                Some(next) if cursor.as_deref() == Some(next.as_str()) => {
                    warn!(server = %profile.name, cursor = %next, "tools/list repeated its cursor");
                    return Ok(tools);
                }
                Some(next) => cursor = Some(next),
            }
        }

        warn!(
            server = %profile.name,
            attempt,
            pages = max_pages,
            "tools/list page limit reached"
        );
        Ok(tools)
    }
}
