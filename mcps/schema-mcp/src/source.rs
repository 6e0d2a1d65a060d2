//! Schema sources
//!
//! A [`SchemaSource`] answers catalog questions for one backing store. The
//! direct database client and the remote API client both implement it, so
//! tools treat them interchangeably.

use async_trait::async_trait;
use std::collections::HashSet;

use crate::error::SchemaResult;
use crate::types::TableInfo;

#[async_trait]
pub trait SchemaSource: Send + Sync {
    /// Short name used in logs and error messages
    fn name(&self) -> &str;

    /// All table names, in catalog enumeration order
    async fn list_tables(&self) -> SchemaResult<Vec<String>>;

    /// Full descriptor for one table, or `None` if it does not exist
    async fn get_table_info(&self, table_name: &str) -> SchemaResult<Option<TableInfo>>;

    /// Tables whose name contains `keyword`, ignoring case.
    ///
    /// Results keep catalog order. An empty keyword matches every table.
    async fn search_tables(&self, keyword: &str) -> SchemaResult<Vec<TableInfo>> {
        let needle = keyword.to_lowercase();
        let mut seen = HashSet::new();
        let mut matches = Vec::new();

        for name in self.list_tables().await? {
            if !name.to_lowercase().contains(&needle) || !seen.insert(name.clone()) {
                continue;
            }
            // A table dropped between listing and reflection is skipped.
            if let Some(info) = self.get_table_info(&name).await? {
                matches.push(info);
            }
        }

        tracing::debug!(source = self.name(), keyword, matched = matches.len(), "Searched tables");
        Ok(matches)
    }
}
