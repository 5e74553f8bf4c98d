//! Fluent INSERT, UPDATE, and DELETE construction.
//!
//! One builder type per statement mode, so a terminal operation that does
//! not belong to the mode simply does not exist on the type.

use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use crate::error::{LiteKitError, Result};
use crate::introspect;
use crate::schema::quote_ident;
use crate::value::Value;

/// One staging step of an insert, replayed in order against the live
/// column list at execution time.
#[derive(Debug, Clone)]
enum InsertStaging {
    /// A named field assignment.
    Field(String, Value),
    /// A positional row, mapped by table column order.
    Row(Vec<Value>),
}

/// Replays staged steps into an insertion-ordered field list. A later step
/// writing a column already staged overwrites its value in place.
///
/// Positional rows consume `column_order` left to right, stopping once the
/// supplied values run out — columns beyond the supplied count stay unset.
fn resolve_staged(staged: Vec<InsertStaging>, column_order: &[String]) -> Vec<(String, Value)> {
    let mut fields: Vec<(String, Value)> = Vec::new();
    let upsert = |fields: &mut Vec<(String, Value)>, name: String, value: Value| {
        if let Some(slot) = fields.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = value;
        } else {
            fields.push((name, value));
        }
    };

    for step in staged {
        match step {
            InsertStaging::Field(name, value) => upsert(&mut fields, name, value),
            InsertStaging::Row(values) => {
                for (column, value) in column_order.iter().zip(values) {
                    upsert(&mut fields, column.clone(), value);
                }
            }
        }
    }
    fields
}

/// Stages and executes an INSERT.
#[derive(Debug)]
pub struct InsertBuilder {
    pool: SqlitePool,
    table: String,
    staged: Vec<InsertStaging>,
    batch: Vec<Vec<Value>>,
}

impl InsertBuilder {
    pub(crate) fn new(pool: SqlitePool, table: impl Into<String>) -> Self {
        Self {
            pool,
            table: table.into(),
            staged: Vec::new(),
            batch: Vec::new(),
        }
    }

    /// Stages one field by name.
    #[must_use]
    pub fn field(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.staged
            .push(InsertStaging::Field(column.to_string(), value.into()));
        self
    }

    /// Stages a row positionally: values map onto the live table's column
    /// order left to right, stopping once the values run out.
    #[must_use]
    pub fn row(mut self, values: Vec<Value>) -> Self {
        self.staged.push(InsertStaging::Row(values));
        self
    }

    /// Queues rows for a batch insert over the full live column list.
    ///
    /// Rows shorter than the column count are padded with NULL at the tail.
    /// Rows longer than the column count fail the whole call with a `Data`
    /// error before anything is sent.
    #[must_use]
    pub fn rows(mut self, rows: Vec<Vec<Value>>) -> Self {
        self.batch.extend(rows);
        self
    }

    /// Executes the staged insert and returns the number of inserted rows.
    ///
    /// Dispatches to the batch path when any batch rows are queued (staged
    /// single fields are kept separate from the batch and are not sent),
    /// otherwise inserts the singly-staged row. Either path commits once
    /// per call.
    pub async fn record(self) -> Result<u64> {
        if self.batch.is_empty() {
            self.insert_single().await
        } else {
            if !self.staged.is_empty() {
                warn!(
                    table = %self.table,
                    "Batch insert queued; singly-staged fields are not sent"
                );
            }
            self.insert_batch().await
        }
    }

    async fn insert_single(self) -> Result<u64> {
        // Column order is only needed when a positional row was staged.
        let needs_order = self
            .staged
            .iter()
            .any(|s| matches!(s, InsertStaging::Row(_)));
        let column_order = if needs_order {
            introspect::table_schema(&self.pool, &self.table)
                .await?
                .column_names()
        } else {
            Vec::new()
        };

        let fields = resolve_staged(self.staged, &column_order);
        if fields.is_empty() {
            warn!(table = %self.table, "No fields staged for insert, nothing inserted");
            return Ok(0);
        }

        let columns: Vec<String> = fields.iter().map(|(n, _)| quote_ident(n)).collect();
        let placeholders: Vec<&str> = fields.iter().map(|_| "?").collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_ident(&self.table),
            columns.join(", "),
            placeholders.join(", ")
        );
        debug!(sql = %sql, "Executing SQL");

        let mut query = sqlx::query(&sql);
        for (_, value) in fields {
            query = value.bind(query);
        }
        let result = query.execute(&self.pool).await?;

        info!(table = %self.table, "Record inserted");
        Ok(result.rows_affected())
    }

    async fn insert_batch(self) -> Result<u64> {
        let columns = introspect::table_schema(&self.pool, &self.table)
            .await?
            .column_names();

        // Validate widths before anything is sent.
        for (index, row) in self.batch.iter().enumerate() {
            if row.len() > columns.len() {
                return Err(LiteKitError::Data(format!(
                    "batch row {} has {} values but table '{}' has {} columns",
                    index,
                    row.len(),
                    self.table,
                    columns.len()
                )));
            }
        }

        let quoted: Vec<String> = columns.iter().map(|c| quote_ident(c)).collect();
        let placeholders: Vec<&str> = columns.iter().map(|_| "?").collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_ident(&self.table),
            quoted.join(", "),
            placeholders.join(", ")
        );

        let mut tx = self.pool.begin().await?;
        let mut inserted = 0u64;
        for mut row in self.batch {
            if row.len() < columns.len() {
                debug!(
                    table = %self.table,
                    supplied = row.len(),
                    width = columns.len(),
                    "Padding short batch row with NULL"
                );
                row.resize(columns.len(), Value::Null);
            }
            let mut query = sqlx::query(&sql);
            for value in row {
                query = value.bind(query);
            }
            inserted += query.execute(&mut *tx).await?.rows_affected();
        }
        tx.commit().await?;

        info!(table = %self.table, rows = inserted, "Batch inserted");
        Ok(inserted)
    }
}

/// Stages and executes an UPDATE.
#[derive(Debug)]
pub struct UpdateBuilder {
    pool: SqlitePool,
    table: String,
    fields: Vec<(String, Value)>,
    predicate: Option<(String, Vec<Value>)>,
}

impl UpdateBuilder {
    pub(crate) fn new(pool: SqlitePool, table: impl Into<String>) -> Self {
        Self {
            pool,
            table: table.into(),
            fields: Vec::new(),
            predicate: None,
        }
    }

    /// Stages one field assignment by name. Staging the same column again
    /// overwrites its value.
    #[must_use]
    pub fn field(mut self, column: &str, value: impl Into<Value>) -> Self {
        let value = value.into();
        if let Some(slot) = self.fields.iter_mut().find(|(n, _)| n == column) {
            slot.1 = value;
        } else {
            self.fields.push((column.to_string(), value));
        }
        self
    }

    /// Sets the predicate; a later call replaces it.
    #[must_use]
    pub fn filter(mut self, clause: &str, params: Vec<Value>) -> Self {
        self.predicate = Some((clause.to_string(), params));
        self
    }

    /// Executes the update and returns the number of affected rows.
    ///
    /// With no predicate every row is updated; that is allowed but loudly
    /// logged at warn level.
    pub async fn record(self) -> Result<u64> {
        if self.fields.is_empty() {
            warn!(table = %self.table, "No fields staged for update, nothing updated");
            return Ok(0);
        }

        let assignments: Vec<String> = self
            .fields
            .iter()
            .map(|(n, _)| format!("{} = ?", quote_ident(n)))
            .collect();
        let mut sql = format!(
            "UPDATE {} SET {}",
            quote_ident(&self.table),
            assignments.join(", ")
        );

        let mut params: Vec<Value> = self.fields.into_iter().map(|(_, v)| v).collect();
        match self.predicate {
            Some((clause, clause_params)) => {
                sql.push_str(" WHERE ");
                sql.push_str(&clause);
                params.extend(clause_params);
            }
            None => {
                warn!(table = %self.table, "UPDATE with no WHERE clause affects every row");
            }
        }

        debug!(sql = %sql, "Executing SQL");
        let mut query = sqlx::query(&sql);
        for value in params {
            query = value.bind(query);
        }
        let result = query.execute(&self.pool).await?;

        info!(table = %self.table, rows = result.rows_affected(), "Records updated");
        Ok(result.rows_affected())
    }
}

/// Stages and executes a DELETE.
#[derive(Debug)]
pub struct DeleteBuilder {
    pool: SqlitePool,
    table: String,
    predicate: Option<(String, Vec<Value>)>,
}

impl DeleteBuilder {
    pub(crate) fn new(pool: SqlitePool, table: impl Into<String>) -> Self {
        Self {
            pool,
            table: table.into(),
            predicate: None,
        }
    }

    /// Sets the predicate; a later call replaces it.
    #[must_use]
    pub fn filter(mut self, clause: &str, params: Vec<Value>) -> Self {
        self.predicate = Some((clause.to_string(), params));
        self
    }

    /// Executes the delete and returns the number of removed rows.
    ///
    /// With no predicate every row is removed; same warning contract as
    /// update.
    pub async fn execute(self) -> Result<u64> {
        let mut sql = format!("DELETE FROM {}", quote_ident(&self.table));
        let mut params = Vec::new();

        match self.predicate {
            Some((clause, clause_params)) => {
                sql.push_str(" WHERE ");
                sql.push_str(&clause);
                params = clause_params;
            }
            None => {
                warn!(table = %self.table, "DELETE with no WHERE clause removes every row");
            }
        }

        debug!(sql = %sql, "Executing SQL");
        let mut query = sqlx::query(&sql);
        for value in params {
            query = value.bind(query);
        }
        let result = query.execute(&self.pool).await?;

        info!(table = %self.table, rows = result.rows_affected(), "Records deleted");
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| (*n).to_string()).collect()
    }

    #[test]
    fn test_resolve_positional_row_stops_at_supplied_count() {
        let staged = vec![InsertStaging::Row(vec![
            Value::from(1i64),
            Value::from("Ada"),
        ])];
        let fields = resolve_staged(staged, &cols(&["id", "name", "age", "email"]));
        assert_eq!(
            fields,
            vec![
                ("id".to_string(), Value::Integer(1)),
                ("name".to_string(), Value::Text("Ada".into())),
            ]
        );
    }

    #[test]
    fn test_resolve_later_staging_overwrites_same_column() {
        let staged = vec![
            InsertStaging::Row(vec![Value::from(1i64), Value::from("Ada")]),
            InsertStaging::Field("name".to_string(), Value::from("Grace")),
        ];
        let fields = resolve_staged(staged, &cols(&["id", "name"]));
        assert_eq!(
            fields,
            vec![
                ("id".to_string(), Value::Integer(1)),
                ("name".to_string(), Value::Text("Grace".into())),
            ]
        );
    }

    #[test]
    fn test_resolve_named_fields_keep_insertion_order() {
        let staged = vec![
            InsertStaging::Field("b".to_string(), Value::from(2i64)),
            InsertStaging::Field("a".to_string(), Value::from(1i64)),
            InsertStaging::Field("b".to_string(), Value::from(3i64)),
        ];
        let fields = resolve_staged(staged, &[]);
        assert_eq!(
            fields,
            vec![
                ("b".to_string(), Value::Integer(3)),
                ("a".to_string(), Value::Integer(1)),
            ]
        );
    }
}
