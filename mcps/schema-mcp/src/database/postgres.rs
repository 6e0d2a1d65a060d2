//! PostgreSQL reflection
//!
//! Reads `pg_catalog` for the ordinary and partitioned tables of the
//! session's current schema (`public` unless `search_path` says otherwise).
//! Table and column comments come from `obj_description` / `col_description`.

use async_trait::async_trait;
use tokio_postgres::{Client, NoTls, Row};

use crate::error::SchemaResult;
use crate::source::SchemaSource;
use crate::types::{max_length_of, ColumnInfo, ForeignKeyInfo, IndexInfo, TableInfo};

const LIST_TABLES: &str = "
    SELECT c.relname::text
    FROM pg_catalog.pg_class c
    JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
    WHERE n.nspname = current_schema() AND c.relkind IN ('r', 'p')
    ORDER BY c.relname";

// Exact-case match first, then any case.
const RESOLVE_TABLE: &str = "
    SELECT c.oid, c.relname::text, pg_catalog.obj_description(c.oid, 'pg_class')
    FROM pg_catalog.pg_class c
    JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
    WHERE n.nspname = current_schema()
      AND c.relkind IN ('r', 'p')
      AND lower(c.relname::text) = lower($1::text)
    ORDER BY c.relname::text = $1::text DESC, c.relname
    LIMIT 1";

const COLUMNS: &str = "
    SELECT a.attname::text,
           pg_catalog.format_type(a.atttypid, a.atttypmod),
           a.attnotnull,
           pg_catalog.pg_get_expr(d.adbin, d.adrelid),
           pg_catalog.col_description(a.attrelid, a.attnum),
           COALESCE(a.attnum = ANY(pk.indkey::int2[]), false)
    FROM pg_catalog.pg_attribute a
    LEFT JOIN pg_catalog.pg_attrdef d ON d.adrelid = a.attrelid AND d.adnum = a.attnum
    LEFT JOIN pg_catalog.pg_index pk ON pk.indrelid = a.attrelid AND pk.indisprimary
    WHERE a.attrelid = $1 AND a.attnum > 0 AND NOT a.attisdropped
    ORDER BY a.attnum";

const FOREIGN_KEYS: &str = "
    SELECT a.attname::text, parent.relname::text, pa.attname::text
    FROM pg_catalog.pg_constraint con
    CROSS JOIN LATERAL unnest(con.conkey, con.confkey) WITH ORDINALITY AS k(attnum, parent_attnum, ord)
    JOIN pg_catalog.pg_attribute a ON a.attrelid = con.conrelid AND a.attnum = k.attnum
    JOIN pg_catalog.pg_class parent ON parent.oid = con.confrelid
    JOIN pg_catalog.pg_attribute pa ON pa.attrelid = con.confrelid AND pa.attnum = k.parent_attnum
    WHERE con.conrelid = $1 AND con.contype = 'f'
    ORDER BY con.conname, k.ord";

// The primary key index is reported through the columns instead.
const INDEXES: &str = "
    SELECT ic.relname::text,
           i.indisunique,
           ARRAY(
               SELECT a.attname::text
               FROM unnest(i.indkey::int2[]) WITH ORDINALITY AS k(attnum, ord)
               JOIN pg_catalog.pg_attribute a ON a.attrelid = i.indrelid AND a.attnum = k.attnum
               ORDER BY k.ord
           )
    FROM pg_catalog.pg_index i
    JOIN pg_catalog.pg_class ic ON ic.oid = i.indexrelid
    WHERE i.indrelid = $1 AND NOT i.indisprimary
    ORDER BY ic.relname";

/// Catalog reader over one PostgreSQL session.
pub struct PostgresCatalog {
    client: Client,
}

impl PostgresCatalog {
    /// Connect with a libpq-style URL and drive the connection in the
    /// background.
    pub async fn connect(conninfo: &str) -> Result<Self, tokio_postgres::Error> {
        let (client, connection) = tokio_postgres::connect(conninfo, NoTls).await?;

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!("PostgreSQL connection error: {}", e);
            }
        });

        Ok(Self::from_client(client))
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    pub async fn server_version(&self) -> SchemaResult<String> {
        let row = self.client.query_one("SELECT version()", &[]).await?;
        Ok(row.try_get(0)?)
    }
}

#[async_trait]
impl SchemaSource for PostgresCatalog {
    fn name(&self) -> &str {
        "postgres"
    }

    async fn list_tables(&self) -> SchemaResult<Vec<String>> {
        let rows = self.client.query(LIST_TABLES, &[]).await?;
        let names = rows
            .iter()
            .map(|row| row.try_get(0))
            .collect::<Result<Vec<String>, _>>()?;
        Ok(names)
    }

    async fn get_table_info(&self, table_name: &str) -> SchemaResult<Option<TableInfo>> {
        let Some(row) = self.client.query_opt(RESOLVE_TABLE, &[&table_name]).await? else {
            tracing::debug!(table = table_name, "Table not found");
            return Ok(None);
        };
        let oid: u32 = row.try_get(0)?;
        let name: String = row.try_get(1)?;
        let comment: Option<String> = row.try_get(2)?;

        let columns = self
            .client
            .query(COLUMNS, &[&oid])
            .await?
            .iter()
            .map(column_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        let foreign_keys = self
            .client
            .query(FOREIGN_KEYS, &[&oid])
            .await?
            .iter()
            .map(|row| {
                Ok(ForeignKeyInfo {
                    column: row.try_get(0)?,
                    referenced_table: row.try_get(1)?,
                    referenced_column: row.try_get(2)?,
                })
            })
            .collect::<Result<Vec<_>, tokio_postgres::Error>>()?;

        let indexes = self
            .client
            .query(INDEXES, &[&oid])
            .await?
            .iter()
            .map(|row| {
                Ok(IndexInfo {
                    name: row.try_get(0)?,
                    unique: row.try_get(1)?,
                    columns: row.try_get(2)?,
                })
            })
            .collect::<Result<Vec<_>, tokio_postgres::Error>>()?;

        tracing::debug!(
            table = %name,
            columns = columns.len(),
            foreign_keys = foreign_keys.len(),
            indexes = indexes.len(),
            "Reflected table"
        );

        Ok(Some(TableInfo {
            name,
            comment,
            columns,
            foreign_keys,
            indexes,
        }))
    }
}

fn column_from_row(row: &Row) -> Result<ColumnInfo, tokio_postgres::Error> {
    let data_type: String = row.try_get(1)?;
    let not_null: bool = row.try_get(2)?;
    let is_primary_key: bool = row.try_get(5)?;
    Ok(ColumnInfo {
        name: row.try_get(0)?,
        max_length: max_length_of(&data_type),
        data_type,
        nullable: !not_null && !is_primary_key,
        default: row.try_get(3)?,
        comment: row.try_get(4)?,
        is_primary_key,
    })
}
