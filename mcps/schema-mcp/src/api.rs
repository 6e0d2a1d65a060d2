//! Remote schema API client
//!
//! Fetches the same [`TableInfo`] shape from an HTTP schema service:
//!
//! - `GET {base}/api/schema/tables` returns `["table", ...]`
//! - `GET {base}/api/schema/tables/{name}` returns a `TableInfo`, or 404

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use std::time::Duration;

use crate::config::ApiConfig;
use crate::error::{SchemaError, SchemaResult};
use crate::source::SchemaSource;
use crate::types::TableInfo;

pub struct ApiClient {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

impl ApiClient {
    /// Build a client for `base_url`. The URL is validated up front so a
    /// misconfigured endpoint fails at startup rather than on first use.
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> SchemaResult<Self> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| SchemaError::Connection(format!("invalid API base URL '{}': {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(SchemaError::Connection(format!(
                "API base URL '{}' cannot carry a path",
                base_url
            )));
        }

        let client = Client::builder()
            .user_agent(concat!("schema-mcp/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url,
            token,
        })
    }

    pub fn from_config(config: &ApiConfig) -> SchemaResult<Option<Self>> {
        config
            .base_url
            .as_deref()
            .map(|url| {
                Self::new(
                    url,
                    config.token.clone(),
                    Duration::from_secs(config.timeout_secs),
                )
            })
            .transpose()
    }

    fn endpoint(&self, table: Option<&str>) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(["api", "schema", "tables"]);
            if let Some(table) = table {
                segments.push(table);
            }
        }
        url
    }

    async fn get(&self, url: Url) -> SchemaResult<reqwest::Response> {
        tracing::debug!(%url, "Fetching schema");
        let mut request = self.client.get(url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        Ok(request.send().await?)
    }
}

#[async_trait]
impl SchemaSource for ApiClient {
    fn name(&self) -> &str {
        "api"
    }

    async fn list_tables(&self) -> SchemaResult<Vec<String>> {
        let response = self.get(self.endpoint(None)).await?.error_for_status()?;
        Ok(response.json().await?)
    }

    async fn get_table_info(&self, table_name: &str) -> SchemaResult<Option<TableInfo>> {
        let response = self.get(self.endpoint(Some(table_name))).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let table = response.error_for_status()?.json().await?;
        Ok(Some(table))
    }
}
