//! MCP Common - shared plumbing for the workspace's MCP servers
//!
//! - **Initialization**: [`init_tracing`] and the `serve_stdio!` macro
//! - **Results**: [`json_success`] for JSON tool responses
//! - **Errors**: [`IntoMcpError`] / [`ResultExt`] for mapping domain errors
//! - **Embeddable**: [`EmbeddableMcp`] for calling tools in-process
//!
//! ```rust,ignore
//! mcp_common::serve_stdio!(SchemaMcpServer::from_env().await, "schema_mcp");
//! ```

pub mod embeddable;
pub mod error;
pub mod init;
pub mod result;

pub use embeddable::{parse_params, EmbeddableError, EmbeddableMcp, EmbeddableResult};
pub use error::{internal_error, invalid_params, IntoMcpError, McpResult, ResultExt};
pub use init::init_tracing;
pub use result::{first_text, json_success};

pub use rmcp::{
    model::{CallToolResult, Content, Tool},
    ErrorData as McpError,
};

pub use async_trait::async_trait;
