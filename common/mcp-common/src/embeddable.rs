//! In-process execution of MCP servers
//!
//! [`EmbeddableMcp`] lets a host call a server's tools directly, without a
//! subprocess or stdio transport in between. Tests use the same path to
//! drive servers end to end.
//!
//! ```rust,ignore
//! use mcp_common::EmbeddableMcp;
//!
//! let tools = server.list_tools();
//! let result = server
//!     .call_tool("search_tables", serde_json::json!({ "keyword": "act" }))
//!     .await?;
//! ```

use async_trait::async_trait;
use rmcp::model::{CallToolResult, ErrorCode, Tool};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Error type for embeddable MCP operations
#[derive(Debug, thiserror::Error)]
pub enum EmbeddableError {
    /// Tool was not found in the server
    #[error("tool not found: {0}")]
    ToolNotFound(String),

    /// Arguments were missing, mistyped, or rejected by the tool
    #[error("invalid parameters: {0}")]
    InvalidParams(String),

    /// Tool execution failed
    #[error("tool execution failed: {0}")]
    ExecutionError(String),
}

impl From<rmcp::ErrorData> for EmbeddableError {
    fn from(err: rmcp::ErrorData) -> Self {
        if err.code == ErrorCode::INVALID_PARAMS {
            EmbeddableError::InvalidParams(err.message.to_string())
        } else {
            EmbeddableError::ExecutionError(err.message.to_string())
        }
    }
}

/// Result type for embeddable MCP operations
pub type EmbeddableResult<T> = Result<T, EmbeddableError>;

/// Decode a tool's JSON arguments into its parameter struct.
///
/// Decoding failures are reported as [`EmbeddableError::InvalidParams`], so
/// a malformed call never reaches the tool body.
pub fn parse_params<T: DeserializeOwned>(params: Value) -> EmbeddableResult<T> {
    let params = if params.is_null() {
        Value::Object(Default::default())
    } else {
        params
    };
    serde_json::from_value(params).map_err(|e| EmbeddableError::InvalidParams(e.to_string()))
}

/// Trait for MCP servers that can be executed in-process
///
/// Servers built on rmcp's `#[tool_router]` implement `list_tools` by
/// delegating to their router and `call_tool` by matching on the tool name.
#[async_trait]
pub trait EmbeddableMcp: Send + Sync {
    /// Server name as used in MCP configuration files
    fn server_name(&self) -> &str;

    /// All tools with their names, descriptions, and input schemas
    fn list_tools(&self) -> Vec<Tool>;

    /// Execute a tool by name with a JSON object of arguments
    async fn call_tool(&self, name: &str, params: Value) -> EmbeddableResult<CallToolResult>;

    fn server_description(&self) -> Option<&str> {
        None
    }
}
