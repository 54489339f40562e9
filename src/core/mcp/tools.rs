//! MCP Tools
//!
//! Tool listing payloads returned by `tools/list`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

/// MCP Tool definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    /// Tool name
    pub name: String,

    /// Tool description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Input schema (JSON Schema format), kept opaque
    #[serde(
        rename = "inputSchema",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub input_schema: Option<Value>,
}

impl Tool {
    /// Create a new tool with minimal information
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            input_schema: None,
        }
    }
}

/// One page of a `tools/list` result
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListToolsResult {
    pub tools: Vec<Tool>,

    /// Cursor for the next page, absent on the last page
    #[serde(
        rename = "nextCursor",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub next_cursor: Option<String>,
}

/// Expected tools split into found and missing, in configured order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolMatch {
    pub found: Vec<String>,
    pub missing: Vec<String>,
}

impl ToolMatch {
    /// Compare discovered tool names against `expected`
    pub fn compute<'a, I>(discovered: I, expected: &[String]) -> Self
    where
        I: IntoIterator<Item = &'a Tool>,
    {
        let names: HashSet<&str> = discovered.into_iter().map(|t| t.name.as_str()).collect();
        let (found, missing) = expected
            .iter()
            .cloned()
            .partition(|name| names.contains(name.as_str()));
        Self { found, missing }
    }

    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }

    /// found / expected, 1.0 when nothing is expected
    pub fn ratio(&self) -> f64 {
        let expected = self.found.len() + self.missing.len();
        if expected == 0 {
            1.0
        } else {
            self.found.len() as f64 / expected as f64
        }
    }
}
