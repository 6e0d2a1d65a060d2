//! SQLite reflection
//!
//! Table metadata comes from SQLite's catalog: `sqlite_master` for the table
//! list and the `pragma_*` table-valued functions for columns, keys, and
//! indexes. Only the `main` schema is reflected. SQLite has no table or
//! column comments.

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::error::SchemaResult;
use crate::source::SchemaSource;
use crate::types::{max_length_of, ColumnInfo, ForeignKeyInfo, IndexInfo, TableInfo};

/// Catalog reader over a single long-lived connection.
///
/// `rusqlite::Connection` is not `Sync`; the mutex serializes tool calls
/// that share it.
pub struct SqliteCatalog {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteCatalog {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }
}

#[async_trait]
impl SchemaSource for SqliteCatalog {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn list_tables(&self) -> SchemaResult<Vec<String>> {
        let conn = self.conn.lock().await;
        list_tables(&conn)
    }

    async fn get_table_info(&self, table_name: &str) -> SchemaResult<Option<TableInfo>> {
        let conn = self.conn.lock().await;
        reflect_table(&conn, table_name)
    }
}

fn list_tables(conn: &Connection) -> SchemaResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master \
         WHERE type = 'table' AND name NOT LIKE 'sqlite\\_%' ESCAPE '\\' \
         ORDER BY name",
    )?;
    let names = stmt
        .query_map([], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(names)
}

/// Canonical catalog name for `table_name`, matched case-insensitively the
/// way SQLite resolves identifiers.
fn resolve_table(conn: &Connection, table_name: &str) -> SchemaResult<Option<String>> {
    let name = conn
        .query_row(
            "SELECT name FROM sqlite_master \
             WHERE type = 'table' AND name = ?1 COLLATE NOCASE \
             LIMIT 1",
            params![table_name],
            |row| row.get(0),
        )
        .optional()?;
    Ok(name)
}

fn reflect_table(conn: &Connection, table_name: &str) -> SchemaResult<Option<TableInfo>> {
    let Some(name) = resolve_table(conn, table_name)? else {
        tracing::debug!(table = table_name, "Table not found");
        return Ok(None);
    };

    let columns = reflect_columns(conn, &name)?;
    let foreign_keys = reflect_foreign_keys(conn, &name)?;
    let indexes = reflect_indexes(conn, &name)?;

    tracing::debug!(
        table = %name,
        columns = columns.len(),
        foreign_keys = foreign_keys.len(),
        indexes = indexes.len(),
        "Reflected table"
    );

    Ok(Some(TableInfo {
        name,
        comment: None,
        columns,
        foreign_keys,
        indexes,
    }))
}

fn reflect_columns(conn: &Connection, table: &str) -> SchemaResult<Vec<ColumnInfo>> {
    let mut stmt = conn.prepare(
        "SELECT name, type, \"notnull\", dflt_value, pk \
         FROM pragma_table_info(?1) ORDER BY cid",
    )?;

    let columns = stmt
        .query_map(params![table], |row| {
            let data_type: String = row.get(1)?;
            let pk: i64 = row.get(4)?;
            let not_null: bool = row.get::<_, i64>(2)? != 0;
            Ok(ColumnInfo {
                name: row.get(0)?,
                max_length: max_length_of(&data_type),
                data_type,
                // A primary key column can never hold NULL from the
                // caller's point of view, even when SQLite allows it.
                nullable: !not_null && pk == 0,
                default: row.get(3)?,
                comment: None,
                is_primary_key: pk > 0,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(columns)
}

/// Primary key columns of `table` in key order.
fn primary_key_columns(conn: &Connection, table: &str) -> SchemaResult<Vec<String>> {
    let mut stmt =
        conn.prepare("SELECT name FROM pragma_table_info(?1) WHERE pk > 0 ORDER BY pk")?;
    let names = stmt
        .query_map(params![table], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(names)
}

fn reflect_foreign_keys(conn: &Connection, table: &str) -> SchemaResult<Vec<ForeignKeyInfo>> {
    let mut stmt = conn.prepare(
        "SELECT \"from\", \"table\", \"to\", seq \
         FROM pragma_foreign_key_list(?1) ORDER BY id, seq",
    )?;

    let rows = stmt
        .query_map(params![table], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, i64>(3)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    // `REFERENCES parent` without a column list targets the parent's
    // primary key, which the pragma reports as NULL.
    let mut parent_keys: HashMap<String, Vec<String>> = HashMap::new();
    let mut foreign_keys = Vec::with_capacity(rows.len());
    for (column, referenced_table, referenced_column, seq) in rows {
        let referenced_column = match referenced_column {
            Some(c) => c,
            None => {
                if !parent_keys.contains_key(&referenced_table) {
                    let keys = primary_key_columns(conn, &referenced_table)?;
                    parent_keys.insert(referenced_table.clone(), keys);
                }
                parent_keys[&referenced_table]
                    .get(seq as usize)
                    .cloned()
                    .unwrap_or_else(|| "rowid".to_string())
            }
        };
        foreign_keys.push(ForeignKeyInfo {
            column,
            referenced_table,
            referenced_column,
        });
    }
    Ok(foreign_keys)
}

fn reflect_indexes(conn: &Connection, table: &str) -> SchemaResult<Vec<IndexInfo>> {
    // Auto-indexes backing UNIQUE/PRIMARY KEY constraints are implementation
    // details and are not reported.
    let mut stmt = conn.prepare(
        "SELECT name, \"unique\" FROM pragma_index_list(?1) \
         WHERE name NOT LIKE 'sqlite_autoindex%' ORDER BY name",
    )?;
    let listed = stmt
        .query_map(params![table], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? != 0))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut info_stmt =
        conn.prepare("SELECT name FROM pragma_index_info(?1) ORDER BY seqno")?;
    let mut indexes = Vec::with_capacity(listed.len());
    for (name, unique) in listed {
        // Expression columns have no name; only named columns are listed.
        let columns = info_stmt
            .query_map(params![name], |row| row.get::<_, Option<String>>(0))?
            .filter_map(|c| c.transpose())
            .collect::<Result<Vec<_>, _>>()?;
        indexes.push(IndexInfo {
            name,
            columns,
            unique,
        });
    }
    Ok(indexes)
}
