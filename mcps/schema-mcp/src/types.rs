//! Schema descriptors shared by the database and API sources

use serde::{Deserialize, Serialize};

/// A single column as reported by reflection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    /// Declared type exactly as the database reports it, e.g. `VARCHAR(255)`
    #[serde(rename = "type")]
    pub data_type: String,
    pub nullable: bool,
    #[serde(default)]
    pub default: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub is_primary_key: bool,
    #[serde(default)]
    pub max_length: Option<u32>,
}

/// One referencing column of a foreign key constraint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyInfo {
    pub column: String,
    pub referenced_table: String,
    pub referenced_column: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexInfo {
    pub name: String,
    pub columns: Vec<String>,
    #[serde(default)]
    pub unique: bool,
}

/// Normalized table descriptor.
///
/// Built fresh on every query; columns keep declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableInfo {
    pub name: String,
    #[serde(default)]
    pub comment: Option<String>,
    pub columns: Vec<ColumnInfo>,
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKeyInfo>,
    #[serde(default)]
    pub indexes: Vec<IndexInfo>,
}

impl TableInfo {
    pub fn column(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn primary_keys(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.is_primary_key)
            .map(|c| c.name.as_str())
            .collect()
    }
}

/// Parse the length out of a character or binary type such as
/// `VARCHAR(100)` or `NCHAR (8)`.
///
/// Numeric precision (`DECIMAL(10,2)`) is not a length and yields `None`.
pub fn max_length_of(data_type: &str) -> Option<u32> {
    let upper = data_type.to_ascii_uppercase();
    let is_textual = ["CHAR", "TEXT", "CLOB", "BINARY", "STRING"]
        .iter()
        .any(|t| upper.contains(t));
    if !is_textual {
        return None;
    }

    let open = upper.find('(')?;
    let close = upper[open..].find(')')? + open;
    upper[open + 1..close].trim().parse().ok()
}
