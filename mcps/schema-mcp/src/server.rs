//! Schema MCP Server implementation

use mcp_common::{
    async_trait, json_success, parse_params, EmbeddableError, EmbeddableMcp, EmbeddableResult,
    McpError, ResultExt,
};
use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{
        AnnotateAble, CallToolResult, ListResourcesResult, PaginatedRequestParam, RawResource,
        ReadResourceRequestParam, ReadResourceResult, Resource, ResourceContents,
        ServerCapabilities, ServerInfo, Tool,
    },
    service::RequestContext,
    tool, tool_handler, tool_router, RoleServer,
};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::analysis::{partition_fields, DEFAULT_CONFIDENCE_THRESHOLD};
use crate::api::ApiClient;
use crate::classifier::{classify, FieldContext};
use crate::config::SchemaConfig;
use crate::database::DatabaseClient;
use crate::error::{SchemaError, SchemaResult};
use crate::params::*;
use crate::source::SchemaSource;

const INSTRUCTIONS: &str = "Database schema introspection MCP server. \
    Use list_all_tables to enumerate tables, search_tables to find tables by name, \
    get_table_info for columns, keys and indexes, analyze_table_fields to separate \
    business fields from system fields, and classify_field for a single column. \
    Every table is also readable as the resource table://<name>.";

const TABLE_URI_PREFIX: &str = "table://";

// ============================================================================
// Server Implementation
// ============================================================================

/// Schema MCP Server
#[derive(Clone)]
pub struct SchemaMcpServer {
    database: Arc<dyn SchemaSource>,
    api: Option<Arc<dyn SchemaSource>>,
    confidence_threshold: f64,
    tool_router: ToolRouter<Self>,
}

impl SchemaMcpServer {
    /// Connect to the configured database (and API, if any).
    ///
    /// Fails when no database URL is configured or the database cannot be
    /// opened.
    pub async fn new(config: &SchemaConfig) -> SchemaResult<Self> {
        let threshold = validate_threshold(config.analysis.confidence_threshold)
            .map_err(|e| SchemaError::Configuration(e.to_string()))?;

        let database = DatabaseClient::connect(
            config.database_url()?,
            Duration::from_secs(config.database.busy_timeout_secs),
        )
        .await?;
        if let Some(url) = database.database_url() {
            tracing::info!(backend = database.backend(), %url, "Database source ready");
        }

        let api = ApiClient::from_config(&config.api)?.map(|client| {
            tracing::info!("Remote schema API enabled");
            Arc::new(client) as Arc<dyn SchemaSource>
        });

        Ok(Self::with_sources(Arc::new(database), api).with_confidence_threshold(threshold))
    }

    /// Load configuration from file and environment, then connect
    pub async fn from_env() -> anyhow::Result<Self> {
        let config = SchemaConfig::load()?;
        Ok(Self::new(&config).await?)
    }

    /// Build a server around explicit sources, e.g. test fixtures
    pub fn with_sources(database: Arc<dyn SchemaSource>, api: Option<Arc<dyn SchemaSource>>) -> Self {
        Self {
            database,
            api,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            tool_router: Self::tool_router(),
        }
    }

    pub fn with_confidence_threshold(mut self, threshold: f64) -> Self {
        self.confidence_threshold = threshold;
        self
    }

    fn source(&self, kind: SourceKind) -> SchemaResult<&dyn SchemaSource> {
        match kind {
            SourceKind::Database => Ok(&*self.database),
            SourceKind::Api => self.api.as_deref().ok_or_else(|| {
                SchemaError::Validation(
                    "source 'api' is not configured; set API_BASE_URL to enable it".into(),
                )
            }),
        }
    }

    /// One `table://<name>` resource per database table
    async fn table_resources(&self) -> SchemaResult<Vec<Resource>> {
        let tables = self.database.list_tables().await?;
        Ok(tables
            .into_iter()
            .map(|name| {
                let mut raw = RawResource::new(format!("{}{}", TABLE_URI_PREFIX, name), name.clone());
                raw.description = Some(format!("Columns, keys, and indexes of table {}", name));
                raw.mime_type = Some("application/json".into());
                raw.no_annotation()
            })
            .collect())
    }

    async fn read_table_resource(&self, uri: &str) -> Result<ReadResourceResult, McpError> {
        let name = uri
            .strip_prefix(TABLE_URI_PREFIX)
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| McpError::invalid_params(format!("unsupported resource URI '{}'", uri), None))?;

        let table = self
            .database
            .get_table_info(name)
            .await
            .to_mcp_err()?
            .ok_or_else(|| McpError::resource_not_found(format!("table '{}' not found", name), None))?;

        let text = serde_json::to_string_pretty(&table).to_mcp_err()?;
        Ok(ReadResourceResult {
            contents: vec![ResourceContents::text(text, uri)],
        })
    }
}

/// Reject blank names. The value itself is used untrimmed: surrounding
/// whitespace is part of a quoted identifier.
fn require_non_empty<'a>(field: &str, value: &'a str) -> SchemaResult<&'a str> {
    if value.trim().is_empty() {
        return Err(SchemaError::Validation(format!("{} must not be empty", field)));
    }
    Ok(value)
}

fn validate_threshold(threshold: f64) -> SchemaResult<f64> {
    if !(0.0..=1.0).contains(&threshold) {
        return Err(SchemaError::Validation(format!(
            "confidence_threshold must be between 0.0 and 1.0, got {}",
            threshold
        )));
    }
    Ok(threshold)
}

#[tool_router]
impl SchemaMcpServer {
    /// Get full metadata for one table
    #[tool(description = "Get a table's structure: columns (type, nullability, default, primary key, max length), foreign keys, and indexes. Returns null if the table does not exist.")]
    async fn get_table_info(&self, Parameters(params): Parameters<TableInfoParams>) -> Result<CallToolResult, McpError> {
        let table_name = require_non_empty("table_name", &params.table_name).to_mcp_err()?;
        let source = self.source(params.source).to_mcp_err()?;

        let table = source.get_table_info(table_name).await.to_mcp_err()?;
        if table.is_none() {
            tracing::info!(table = table_name, source = source.name(), "Table not found");
        }

        json_success(&table)
    }

    /// List every table name
    #[tool(description = "List the names of all tables in the database, in catalog order.")]
    async fn list_all_tables(&self, Parameters(params): Parameters<ListTablesParams>) -> Result<CallToolResult, McpError> {
        let source = self.source(params.source).to_mcp_err()?;
        let tables = source.list_tables().await.to_mcp_err()?;
        json_success(&tables)
    }

    /// Search tables by name
    #[tool(description = "Find tables whose name contains a keyword (case-insensitive substring match) and return their full structure. An empty keyword returns every table.")]
    async fn search_tables(&self, Parameters(params): Parameters<SearchTablesParams>) -> Result<CallToolResult, McpError> {
        let source = self.source(params.source).to_mcp_err()?;
        let tables = source.search_tables(&params.keyword).await.to_mcp_err()?;
        json_success(&tables)
    }

    /// Split a table's columns into business, system, and uncertain fields
    #[tool(description = "Classify every column of a table as a business field or a system field (audit timestamps, soft-delete flags, tenancy codes, versioning). Fields whose rule confidence is below the threshold are reported as uncertain. Returns null if the table does not exist.")]
    async fn analyze_table_fields(&self, Parameters(params): Parameters<AnalyzeFieldsParams>) -> Result<CallToolResult, McpError> {
        let table_name = require_non_empty("table_name", &params.table_name).to_mcp_err()?;
        let threshold = validate_threshold(
            params.confidence_threshold.unwrap_or(self.confidence_threshold),
        )
        .to_mcp_err()?;
        let source = self.source(params.source).to_mcp_err()?;

        let partition = source
            .get_table_info(table_name)
            .await
            .to_mcp_err()?
            .map(|table| partition_fields(&table, threshold));

        json_success(&partition)
    }

    /// Classify a single column description
    #[tool(description = "Classify one column as a system or business field from its name and declared type. Returns the verdict, a fixed rule confidence, the category, and the reasoning.")]
    async fn classify_field(&self, Parameters(params): Parameters<ClassifyFieldParams>) -> Result<CallToolResult, McpError> {
        let field_name = require_non_empty("field_name", &params.field_name).to_mcp_err()?;

        let result = classify(&FieldContext {
            field_name,
            field_type: &params.field_type,
            field_comment: params.field_comment.as_deref(),
            table_name: params.table_name.as_deref(),
            table_comment: params.table_comment.as_deref(),
        });

        json_success(&result)
    }
}

#[tool_handler]
impl rmcp::ServerHandler for SchemaMcpServer {
    fn get_info(&self) -> ServerInfo {
        let api = if self.api.is_some() { "enabled" } else { "not configured" };
        ServerInfo {
            instructions: Some(format!("{} Remote API source: {}.", INSTRUCTIONS, api)),
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .build(),
            ..Default::default()
        }
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParam>,
        _: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, McpError> {
        let resources = self.table_resources().await.to_mcp_err()?;
        Ok(ListResourcesResult::with_all_items(resources))
    }

    async fn read_resource(
        &self,
        request: ReadResourceRequestParam,
        _: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, McpError> {
        self.read_table_resource(&request.uri).await
    }
}

// ============================================================================
// EmbeddableMcp Implementation
// ============================================================================

#[async_trait]
impl EmbeddableMcp for SchemaMcpServer {
    fn server_name(&self) -> &str {
        "schema"
    }

    fn server_description(&self) -> Option<&str> {
        Some(INSTRUCTIONS)
    }

    fn list_tools(&self) -> Vec<Tool> {
        self.tool_router.list_all()
    }

    async fn call_tool(&self, name: &str, params: Value) -> EmbeddableResult<CallToolResult> {
        match name {
            "get_table_info" => {
                let params: TableInfoParams = parse_params(params)?;
                self.get_table_info(Parameters(params)).await.map_err(Into::into)
            }

            "list_all_tables" => {
                let params: ListTablesParams = parse_params(params)?;
                self.list_all_tables(Parameters(params)).await.map_err(Into::into)
            }

            "search_tables" => {
                let params: SearchTablesParams = parse_params(params)?;
                self.search_tables(Parameters(params)).await.map_err(Into::into)
            }

            "analyze_table_fields" => {
                let params: AnalyzeFieldsParams = parse_params(params)?;
                self.analyze_table_fields(Parameters(params))
                    .await
                    .map_err(Into::into)
            }

            "classify_field" => {
                let params: ClassifyFieldParams = parse_params(params)?;
                self.classify_field(Parameters(params)).await.map_err(Into::into)
            }

            _ => Err(EmbeddableError::ToolNotFound(name.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TableInfo;
    use mcp_common::first_text;
    use rmcp::model::ErrorCode;
    use rusqlite::Connection;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fixture_server() -> SchemaMcpServer {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            r#"
            CREATE TABLE activities (
                id INTEGER PRIMARY KEY,
                title VARCHAR(255) NOT NULL,
                description TEXT,
                version INTEGER,
                created_at TIMESTAMP
            );
            CREATE TABLE users (
                id INTEGER PRIMARY KEY,
                username VARCHAR(50) NOT NULL
            );
            "#,
        )
        .unwrap();
        SchemaMcpServer::with_sources(Arc::new(DatabaseClient::from_connection(conn)), None)
    }

    /// Source that records how often it was touched
    #[derive(Default)]
    struct CountingSource {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SchemaSource for CountingSource {
        fn name(&self) -> &str {
            "counting"
        }

        async fn list_tables(&self) -> SchemaResult<Vec<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![])
        }

        async fn get_table_info(&self, _table_name: &str) -> SchemaResult<Option<TableInfo>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(None)
        }
    }

    fn json_of(result: &CallToolResult) -> Value {
        serde_json::from_str(first_text(result).unwrap()).unwrap()
    }

    #[test]
    fn test_embeddable_list_tools() {
        let server = fixture_server();
        assert_eq!(server.server_name(), "schema");

        let mut names: Vec<String> = server
            .list_tools()
            .iter()
            .map(|t| t.name.to_string())
            .collect();
        names.sort();
        assert_eq!(
            names,
            vec![
                "analyze_table_fields",
                "classify_field",
                "get_table_info",
                "list_all_tables",
                "search_tables",
            ]
        );
    }

    #[tokio::test]
    async fn test_get_table_info_tool() {
        let server = fixture_server();
        let result = server
            .call_tool("get_table_info", serde_json::json!({ "table_name": "activities" }))
            .await
            .unwrap();

        let table = json_of(&result);
        assert_eq!(table["name"], "activities");
        assert_eq!(table["columns"].as_array().unwrap().len(), 5);
        assert_eq!(table["columns"][0]["is_primary_key"], true);
        assert_eq!(table["columns"][1]["type"], "VARCHAR(255)");
    }

    #[tokio::test]
    async fn test_get_table_info_missing_returns_null() {
        let server = fixture_server();
        let result = server
            .call_tool("get_table_info", serde_json::json!({ "table_name": "nope" }))
            .await
            .unwrap();
        assert_eq!(json_of(&result), Value::Null);
    }

    #[tokio::test]
    async fn test_list_all_tables_tool() {
        let server = fixture_server();
        let result = server
            .call_tool("list_all_tables", serde_json::json!({}))
            .await
            .unwrap();
        assert_eq!(json_of(&result), serde_json::json!(["activities", "users"]));
    }

    #[tokio::test]
    async fn test_search_tables_tool() {
        let server = fixture_server();
        let result = server
            .search_tables(Parameters(SearchTablesParams {
                keyword: "ACT".into(),
                source: SourceKind::Database,
            }))
            .await
            .unwrap();

        let tables = json_of(&result);
        assert_eq!(tables.as_array().unwrap().len(), 1);
        assert_eq!(tables[0]["name"], "activities");
    }

    #[tokio::test]
    async fn test_analyze_table_fields_tool() {
        let server = fixture_server();
        let result = server
            .call_tool(
                "analyze_table_fields",
                serde_json::json!({ "table_name": "activities" }),
            )
            .await
            .unwrap();

        let partition = json_of(&result);
        assert_eq!(partition["threshold"], 0.7);
        let names = |key: &str| -> Vec<String> {
            partition[key]
                .as_array()
                .unwrap()
                .iter()
                .map(|f| f["column"]["name"].as_str().unwrap().to_string())
                .collect()
        };
        assert_eq!(names("business"), vec!["id", "description"]);
        assert_eq!(names("system"), vec!["version", "created_at"]);
        assert_eq!(names("uncertain"), vec!["title"]);
        assert_eq!(partition["system"][1]["classification"]["category"], "system_audit");
    }

    #[tokio::test]
    async fn test_analyze_uses_server_threshold() {
        let server = fixture_server().with_confidence_threshold(0.5);
        let result = server
            .call_tool(
                "analyze_table_fields",
                serde_json::json!({ "table_name": "activities" }),
            )
            .await
            .unwrap();

        let partition = json_of(&result);
        assert_eq!(partition["threshold"], 0.5);
        assert!(partition["uncertain"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_classify_field_tool() {
        let server = fixture_server();
        let result = server
            .call_tool(
                "classify_field",
                serde_json::json!({ "field_name": "is_deleted", "field_type": "BOOLEAN" }),
            )
            .await
            .unwrap();

        let verdict = json_of(&result);
        assert_eq!(verdict["is_system_field"], true);
        assert_eq!(verdict["confidence"], 0.95);
        assert_eq!(verdict["category"], "system_technical");
    }

    #[tokio::test]
    async fn test_validation_happens_before_database_access() {
        let source = Arc::new(CountingSource::default());
        let server = SchemaMcpServer::with_sources(source.clone(), None);

        let missing = server.call_tool("get_table_info", serde_json::json!({})).await;
        assert!(matches!(missing, Err(EmbeddableError::InvalidParams(_))));

        let mistyped = server
            .call_tool("search_tables", serde_json::json!({ "keyword": 42 }))
            .await;
        assert!(matches!(mistyped, Err(EmbeddableError::InvalidParams(_))));

        let empty = server
            .call_tool("get_table_info", serde_json::json!({ "table_name": "  " }))
            .await;
        assert!(matches!(empty, Err(EmbeddableError::InvalidParams(_))));

        let bad_threshold = server
            .call_tool(
                "analyze_table_fields",
                serde_json::json!({ "table_name": "activities", "confidence_threshold": 1.5 }),
            )
            .await;
        assert!(matches!(bad_threshold, Err(EmbeddableError::InvalidParams(_))));

        let bad_source = server
            .call_tool(
                "list_all_tables",
                serde_json::json!({ "source": "metabase" }),
            )
            .await;
        assert!(matches!(bad_source, Err(EmbeddableError::InvalidParams(_))));

        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_api_source_not_configured() {
        let server = fixture_server();
        let err = server
            .list_all_tables(Parameters(ListTablesParams {
                source: SourceKind::Api,
            }))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_api_source_routes_to_api() {
        let database = Arc::new(CountingSource::default());
        let api = Arc::new(CountingSource::default());
        let server = SchemaMcpServer::with_sources(database.clone(), Some(api.clone() as Arc<dyn SchemaSource>));

        server
            .call_tool("list_all_tables", serde_json::json!({ "source": "api" }))
            .await
            .unwrap();

        assert_eq!(api.calls.load(Ordering::SeqCst), 1);
        assert_eq!(database.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let server = fixture_server();
        let result = server.call_tool("drop_table", serde_json::json!({})).await;
        assert!(matches!(result, Err(EmbeddableError::ToolNotFound(_))));
    }

    #[tokio::test]
    async fn test_new_requires_database_url() {
        let result = SchemaMcpServer::new(&SchemaConfig::default()).await;
        assert!(matches!(result, Err(SchemaError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_new_rejects_malformed_url() {
        let mut config = SchemaConfig::default();
        config.database.url = Some("invalid://database/url".into());
        let result = SchemaMcpServer::new(&config).await;
        assert!(matches!(result, Err(SchemaError::Connection(_))));
    }

    #[tokio::test]
    async fn test_search_keyword_is_matched_verbatim() {
        let server = fixture_server();
        for keyword in [" ", "act ", " act"] {
            let result = server
                .call_tool("search_tables", serde_json::json!({ "keyword": keyword }))
                .await
                .unwrap();
            assert_eq!(json_of(&result), serde_json::json!([]), "{keyword:?}");
        }
    }

    #[tokio::test]
    async fn test_table_resources() {
        let server = fixture_server();
        let uris: Vec<String> = server
            .table_resources()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.raw.uri)
            .collect();
        assert_eq!(uris, vec!["table://activities", "table://users"]);
    }

    #[tokio::test]
    async fn test_read_table_resource() {
        let server = fixture_server();
        let result = server.read_table_resource("table://activities").await.unwrap();

        let ResourceContents::TextResourceContents { uri, text, .. } = &result.contents[0] else {
            panic!("expected text contents");
        };
        assert_eq!(uri, "table://activities");
        let table: Value = serde_json::from_str(text).unwrap();
        assert_eq!(table["name"], "activities");
        assert_eq!(table["columns"].as_array().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_read_table_resource_errors() {
        let server = fixture_server();

        let missing = server.read_table_resource("table://orders").await.unwrap_err();
        assert_eq!(missing.code, ErrorCode::RESOURCE_NOT_FOUND);

        for uri in ["file:///etc/passwd", "table://", "table://  "] {
            let err = server.read_table_resource(uri).await.unwrap_err();
            assert_eq!(err.code, ErrorCode::INVALID_PARAMS, "{uri}");
        }
    }
}
