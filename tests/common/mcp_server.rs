//! Mock MCP tool server
//!
//! Wraps a wiremock server with a JSON-RPC `tools/list` handler on `/mcp`
//! and a status endpoint on `/status`.

use serde_json::{Value, json};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

pub struct McpServer {
    pub server: MockServer,
}

fn rpc_id(request: &Request) -> Value {
    serde_json::from_slice::<Value>(&request.body)
        .map(|body| body["id"].clone())
        .unwrap_or(Value::Null)
}

fn tool_list(names: &[&str]) -> Vec<Value> {
    names
        .iter()
        .map(|name| json!({ "name": name, "description": format!("{} tool", name) }))
        .collect()
}

impl McpServer {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn protocol_url(&self) -> String {
        format!("{}/mcp", self.server.uri())
    }

    pub fn status_url(&self) -> String {
        format!("{}/status", self.server.uri())
    }

    /// Answer tools/list with a single page, echoing the request id
    pub async fn with_tools(&self, names: &[&str]) {
        let tools = tool_list(names);
        Mock::given(method("POST"))
            .and(path("/mcp"))
            .respond_with(move |request: &Request| {
                ResponseTemplate::new(200).set_body_json(json!({
                    "jsonrpc": "2.0",
                    "id": rpc_id(request),
                    "result": { "tools": tools }
                }))
            })
            .mount(&self.server)
            .await;
    }

    /// Answer tools/list with cursor pagination; page `n` links to `p{n+1}`
    pub async fn with_paged_tools(&self, pages: Vec<Vec<&'static str>>) {
        Mock::given(method("POST"))
            .and(path("/mcp"))
            .respond_with(move |request: &Request| {
                let body: Value = serde_json::from_slice(&request.body).unwrap_or(Value::Null);
                let page = body["params"]["cursor"]
                    .as_str()
                    .and_then(|c| c.strip_prefix('p'))
                    .and_then(|n| n.parse::<usize>().ok())
                    .unwrap_or(0);
                let tools = pages.get(page).map(|p| tool_list(p)).unwrap_or_default();
                let mut result = json!({ "tools": tools });
                if page + 1 < pages.len() {
                    result["nextCursor"] = json!(format!("p{}", page + 1));
                }
                ResponseTemplate::new(200).set_body_json(json!({
                    "jsonrpc": "2.0",
                    "id": body["id"],
                    "result": result
                }))
            })
            .mount(&self.server)
            .await;
    }

    /// Answer tools/list with a JSON-RPC error object
    pub async fn with_rpc_error(&self, code: i32, message: &'static str) {
        Mock::given(method("POST"))
            .and(path("/mcp"))
            .respond_with(move |request: &Request| {
                ResponseTemplate::new(200).set_body_json(json!({
                    "jsonrpc": "2.0",
                    "id": rpc_id(request),
                    "error": { "code": code, "message": message }
                }))
            })
            .mount(&self.server)
            .await;
    }

    /// Fail the protocol endpoint with a bare HTTP status
    pub async fn with_protocol_status(&self, status: u16) {
        Mock::given(method("POST"))
            .and(path("/mcp"))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
    }

    pub async fn with_status(&self, status: u16, body: Value) {
        Mock::given(method("GET"))
            .and(path("/status"))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    /// Healthy status endpoint
    pub async fn with_ok_status(&self) {
        self.with_status(200, json!({ "status": "ok" })).await;
    }

    /// Status endpoint that answers only after `delay`
    pub async fn with_slow_status(&self, delay: Duration) {
        Mock::given(method("GET"))
            .and(path("/status"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "status": "ok" }))
                    .set_delay(delay),
            )
            .mount(&self.server)
            .await;
    }

    /// Number of received requests with the given HTTP method
    pub async fn requests(&self, http_method: &str) -> usize {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|r| r.method.as_str() == http_method)
            .count()
    }

    pub async fn reset(&self) {
        self.server.reset().await;
    }
}
