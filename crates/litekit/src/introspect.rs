//! Live schema introspection.
//!
//! Every builder that needs column order or constraint metadata reads the
//! schema fresh through these functions at the point of use. Nothing is
//! cached: DDL applied directly to the database between two calls is picked
//! up by the next one. The window between a read and the statement built
//! from it is not locked against concurrent external DDL.

use sqlx::SqlitePool;

use crate::error::{LiteKitError, Result};
use crate::schema::{quote_ident, ColumnDef, DefaultValue, ForeignKeyDef, SqlType, TableSchema};

/// Reads the current shape of `table` from the live database.
///
/// One `PRAGMA table_info` plus one `PRAGMA foreign_key_list`. Fails with a
/// `Schema` error when the table does not exist (the pragma returns no
/// rows).
pub async fn table_schema(pool: &SqlitePool, table: &str) -> Result<TableSchema> {
    let sql = format!("PRAGMA table_info({})", quote_ident(table));
    let rows: Vec<(i64, String, String, i64, Option<String>, i64)> =
        sqlx::query_as(&sql).fetch_all(pool).await?;

    if rows.is_empty() {
        return Err(LiteKitError::Schema(format!(
            "table '{table}' does not exist"
        )));
    }

    let mut schema = TableSchema::new(table);
    for (_cid, name, declared_type, not_null, default, pk) in rows {
        let mut column = ColumnDef::new(name, SqlType::from_declared(&declared_type));
        column.not_null = not_null != 0;
        column.primary_key = pk > 0;
        // The pragma reports the default as SQL text; carry it verbatim so
        // it re-renders byte-identically on rebuild.
        column.default = default.map(DefaultValue::Expression);
        schema.columns.push(column);
    }

    let fk_sql = format!("PRAGMA foreign_key_list({})", quote_ident(table));
    let fk_rows: Vec<(
        i64,
        i64,
        String,
        String,
        Option<String>,
        String,
        String,
        String,
    )> = sqlx::query_as(&fk_sql).fetch_all(pool).await?;

    for (_id, _seq, ref_table, local, referenced, on_update, on_delete, _match) in fk_rows {
        schema.foreign_keys.push(ForeignKeyDef {
            column: local,
            references_table: ref_table,
            // A NULL target means the referenced table's primary key.
            references_column: referenced.unwrap_or_else(|| "id".to_string()),
            on_update: Some(on_update),
            on_delete: Some(on_delete),
        });
    }

    Ok(schema)
}

/// Lists user-defined tables, alphabetically.
pub async fn table_names(pool: &SqlitePool) -> Result<Vec<String>> {
    let rows: Vec<(String,)> = sqlx::query_as(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(|(name,)| name).collect())
}
