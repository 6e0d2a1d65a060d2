//! Schema MCP Library
//!
//! Database schema introspection over MCP: table metadata, name search, and
//! a rule-based split of columns into business and system fields. Metadata
//! comes from a SQLite or PostgreSQL database or, optionally, a remote schema
//! API.
//!
//! # Usage as Library
//!
//! ```rust,ignore
//! use schema_mcp::{SchemaConfig, SchemaMcpServer};
//!
//! let mut config = SchemaConfig::default();
//! config.database.url = Some("sqlite:///data/app.db".into());
//! let server = SchemaMcpServer::new(&config).await?;
//! ```

pub mod analysis;
pub mod api;
pub mod classifier;
pub mod config;
pub mod connection;
pub mod database;
pub mod error;
pub mod params;
pub mod server;
pub mod source;
pub mod types;

// Re-export main server type
pub use server::SchemaMcpServer;

pub use analysis::{partition_fields, FieldAnalysis, FieldPartition};
pub use classifier::{classify, ClassificationResult, FieldCategory, FieldContext};
pub use config::SchemaConfig;
pub use error::{SchemaError, SchemaResult};
pub use source::SchemaSource;
pub use types::{ColumnInfo, ForeignKeyInfo, IndexInfo, TableInfo};

// Re-export parameter types for direct API usage
pub use params::*;
