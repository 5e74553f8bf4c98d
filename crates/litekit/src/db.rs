//! Database entry point: connection lifecycle and builder construction.

use std::path::Path;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::builder::{SchemaBuilder, SchemaIntent};
use crate::error::{LiteKitError, Result};
use crate::introspect;
use crate::query::QueryBuilder;
use crate::rebuild::TableRebuilder;
use crate::record::{DeleteBuilder, InsertBuilder, UpdateBuilder};
use crate::result::ResultSet;
use crate::schema::{quote_ident, TableSchema};
use crate::value::{decode_rows, Value};

/// Owns the single-connection pool and vends builders scoped to a table and
/// an intent.
///
/// The pool is capped at one connection: one logical connection, one writer
/// at a time, matching the engine's own serialization of writers.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens the database file at `path`, creating it when missing.
    pub async fn connect(path: &str) -> Result<Self> {
        let existed = Path::new(path).exists();
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| LiteKitError::Connection {
                path: path.to_string(),
                source: e,
            })?;

        if existed {
            info!(path, "Connected to existing database");
        } else {
            info!(path, "Database file did not exist, created a new one");
        }
        Ok(Self { pool })
    }

    /// Opens a fresh in-memory database.
    pub async fn connect_in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(":memory:")
            .await
            .map_err(|e| LiteKitError::Connection {
                path: ":memory:".to_string(),
                source: e,
            })?;
        Ok(Self { pool })
    }

    /// Returns the underlying pool.
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Returns a builder for creating a new table.
    #[must_use]
    pub fn new_table(&self, table: &str) -> SchemaBuilder {
        SchemaBuilder::new(self.pool.clone(), table, SchemaIntent::Create)
    }

    /// Returns a builder for adding columns to an existing table.
    #[must_use]
    pub fn add_to_table(&self, table: &str) -> SchemaBuilder {
        SchemaBuilder::new(self.pool.clone(), table, SchemaIntent::AddColumns)
    }

    /// Returns a rebuilder for renaming the table or modifying/removing one
    /// of its columns.
    #[must_use]
    pub fn alter_table(&self, table: &str) -> TableRebuilder {
        TableRebuilder::new(self.pool.clone(), table)
    }

    /// Returns an insert builder.
    #[must_use]
    pub fn insert_into(&self, table: &str) -> InsertBuilder {
        InsertBuilder::new(self.pool.clone(), table)
    }

    /// Returns an update builder.
    #[must_use]
    pub fn update(&self, table: &str) -> UpdateBuilder {
        UpdateBuilder::new(self.pool.clone(), table)
    }

    /// Returns a delete builder.
    #[must_use]
    pub fn delete_from(&self, table: &str) -> DeleteBuilder {
        DeleteBuilder::new(self.pool.clone(), table)
    }

    /// Returns a SELECT builder.
    #[must_use]
    pub fn select(&self, table: &str) -> QueryBuilder {
        QueryBuilder::new(self.pool.clone(), table)
    }

    /// Executes a caller-written statement with positional parameters.
    ///
    /// Returns rows and column names when the statement produces any, and
    /// an empty result otherwise.
    pub async fn execute_raw(&self, sql: &str, params: Vec<Value>) -> Result<ResultSet> {
        debug!(sql, "Executing SQL");
        let mut query = sqlx::query(sql);
        for value in params {
            query = value.bind(query);
        }
        let rows = query.fetch_all(&self.pool).await?;
        let (columns, data) = decode_rows(&rows)?;
        Ok(ResultSet::new(columns, data))
    }

    /// Drops a table if it exists.
    pub async fn drop_table(&self, table: &str) -> Result<()> {
        let sql = format!("DROP TABLE IF EXISTS {}", quote_ident(table));
        debug!(sql = %sql, "Executing SQL");
        sqlx::query(&sql).execute(&self.pool).await?;
        info!(table, "Table dropped (if it existed)");
        Ok(())
    }

    /// Lists user-defined tables.
    pub async fn table_names(&self) -> Result<Vec<String>> {
        introspect::table_names(&self.pool).await
    }

    /// Reads the live shape of one table.
    pub async fn describe(&self, table: &str) -> Result<TableSchema> {
        introspect::table_schema(&self.pool, table).await
    }

    /// Renders a human-readable report of every user table: columns with
    /// their constraints, then foreign keys.
    pub async fn schema_report(&self) -> Result<String> {
        let names = self.table_names().await?;
        if names.is_empty() {
            return Ok("No user-defined tables found in the database.\n".to_string());
        }

        let mut report = String::from("=== DATABASE SCHEMA ===\n\n");
        for (index, name) in names.iter().enumerate() {
            let schema = self.describe(name).await?;
            report.push_str(&format!("{}) Table: {}\n", index + 1, name));
            report.push_str("   Columns:\n");
            for column in &schema.columns {
                report.push_str(&format!("     - {}", column.name));
                report.push_str(&format!(" {}", column.sql_type.as_sql()));
                if column.not_null {
                    report.push_str(" NOT NULL");
                }
                if let Some(ref default) = column.default {
                    report.push_str(&format!(" DEFAULT {}", default.to_sql()));
                }
                if column.primary_key {
                    report.push_str(" [PK]");
                }
                report.push('\n');
            }
            if schema.foreign_keys.is_empty() {
                report.push_str("   Foreign Keys: none\n");
            } else {
                report.push_str("   Foreign Keys:\n");
                for fk in &schema.foreign_keys {
                    report.push_str(&format!(
                        "     - {} -> {}({})\n",
                        fk.column, fk.references_table, fk.references_column
                    ));
                }
            }
            report.push('\n');
        }
        Ok(report)
    }

    /// Closes the pool.
    pub async fn close(self) {
        self.pool.close().await;
        info!("Database connection closed");
    }
}
