//! MCP (Model Context Protocol) wire types
//!
//! Only the subset needed to probe a tool server: JSON-RPC envelopes and the
//! `tools/list` result.

pub mod protocol;
pub mod tools;

pub use protocol::{JSONRPC_VERSION, JsonRpcError, JsonRpcRequest, JsonRpcResponse, methods};
pub use tools::{ListToolsResult, Tool, ToolMatch};
