//! Error types for schema introspection

use mcp_common::{internal_error, invalid_params, IntoMcpError, McpError};

/// Errors raised while configuring, connecting, or reflecting a schema.
///
/// A missing table is not an error; lookups return `None` instead.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// No database URL was supplied by config or environment
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The database URL is malformed, unsupported, or unreachable
    #[error("connection error: {0}")]
    Connection(String),

    /// Tool arguments were rejected before touching the database
    #[error("invalid arguments: {0}")]
    Validation(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type SchemaResult<T> = Result<T, SchemaError>;

impl IntoMcpError for SchemaError {
    fn into_mcp_error(self) -> McpError {
        match self {
            SchemaError::Validation(_) => invalid_params(self.to_string()),
            _ => internal_error(self.to_string()),
        }
    }
}
