//! Parameter types for Schema MCP tools

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Where schema metadata is read from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Reflect the connected database directly
    #[default]
    Database,
    /// Ask the configured remote schema API
    Api,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct TableInfoParams {
    #[schemars(description = "Exact table name (matched case-insensitively)")]
    pub table_name: String,

    #[schemars(description = "Metadata source: 'database' (default) or 'api'")]
    #[serde(default)]
    pub source: SourceKind,
}

#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct ListTablesParams {
    #[schemars(description = "Metadata source: 'database' (default) or 'api'")]
    #[serde(default)]
    pub source: SourceKind,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SearchTablesParams {
    #[schemars(description = "Case-insensitive substring to look for in table names; empty matches all")]
    pub keyword: String,

    #[schemars(description = "Metadata source: 'database' (default) or 'api'")]
    #[serde(default)]
    pub source: SourceKind,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct AnalyzeFieldsParams {
    #[schemars(description = "Table whose columns should be classified")]
    pub table_name: String,

    #[schemars(description = "Minimum confidence (0.0-1.0) for a field to count as business or system; defaults to the server setting (0.7)")]
    pub confidence_threshold: Option<f64>,

    #[schemars(description = "Metadata source: 'database' (default) or 'api'")]
    #[serde(default)]
    pub source: SourceKind,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ClassifyFieldParams {
    #[schemars(description = "Column name")]
    pub field_name: String,

    #[schemars(description = "Declared column type, e.g. 'TIMESTAMP' or 'VARCHAR(64)'")]
    pub field_type: String,

    #[schemars(description = "Column comment, if any")]
    pub field_comment: Option<String>,

    #[schemars(description = "Owning table name, used to spot relation fields")]
    pub table_name: Option<String>,

    #[schemars(description = "Owning table comment, if any")]
    pub table_comment: Option<String>,
}
