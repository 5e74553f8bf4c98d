//! Fluent table creation and column addition.

use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use crate::error::{LiteKitError, Result};
use crate::schema::{quote_ident, ColumnDef, ForeignKeyDef, SqlType, TableSchema};

/// What a [`SchemaBuilder`] was opened for.
///
/// Both intents share the staging vocabulary; the terminal operation must
/// match the intent or the call fails with a `Schema` error before any
/// statement is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaIntent {
    /// Stage columns for a new table.
    Create,
    /// Stage columns to append to an existing table.
    AddColumns,
}

/// Accumulates column definitions and foreign keys for table creation or
/// column addition.
///
/// A builder is a single-owner value: each staging call consumes and returns
/// it. It is not shareable across threads.
#[derive(Debug)]
pub struct SchemaBuilder {
    pool: SqlitePool,
    table: String,
    intent: SchemaIntent,
    columns: Vec<ColumnDef>,
    foreign_keys: Vec<ForeignKeyDef>,
    pk_defined: bool,
}

impl SchemaBuilder {
    pub(crate) fn new(pool: SqlitePool, table: impl Into<String>, intent: SchemaIntent) -> Self {
        Self {
            pool,
            table: table.into(),
            intent,
            columns: Vec::new(),
            foreign_keys: Vec::new(),
            pk_defined: false,
        }
    }

    /// Stages an INTEGER PRIMARY KEY column.
    ///
    /// At most one primary key per builder; later calls are no-ops.
    #[must_use]
    pub fn primary_key(mut self, name: &str, autoincrement: bool) -> Self {
        if self.pk_defined {
            debug!(table = %self.table, column = %name, "Primary key already declared, ignoring");
            return self;
        }
        let mut column = ColumnDef::integer(name).primary_key();
        if autoincrement {
            column = column.autoincrement();
        }
        self.columns.push(column);
        self.pk_defined = true;
        self
    }

    /// Stages a TEXT column. See [`ColumnDef::with_constraints`] for the
    /// constraint-token vocabulary.
    #[must_use]
    pub fn text_column(self, name: &str, constraints: &str) -> Self {
        self.typed_column(name, SqlType::Text, constraints)
    }

    /// Stages an INTEGER column.
    #[must_use]
    pub fn int_column(self, name: &str, constraints: &str) -> Self {
        self.typed_column(name, SqlType::Integer, constraints)
    }

    /// Stages a REAL column.
    #[must_use]
    pub fn float_column(self, name: &str, constraints: &str) -> Self {
        self.typed_column(name, SqlType::Real, constraints)
    }

    /// Stages a DATE column.
    #[must_use]
    pub fn date_column(self, name: &str, constraints: &str) -> Self {
        self.typed_column(name, SqlType::Date, constraints)
    }

    /// Stages a fully built column definition.
    #[must_use]
    pub fn column(mut self, column: ColumnDef) -> Self {
        self.columns.push(column);
        self
    }

    /// Stages a foreign key: an INTEGER column plus the referential
    /// constraint.
    ///
    /// Only table creation can carry the constraint; in add-columns intent
    /// the column is staged but the constraint is skipped at execution (the
    /// engine cannot add one to an existing table).
    #[must_use]
    pub fn foreign_key(mut self, column: &str, ref_table: &str, ref_column: &str) -> Self {
        self.columns.push(ColumnDef::integer(column));
        self.foreign_keys
            .push(ForeignKeyDef::new(column, ref_table, ref_column));
        self
    }

    fn typed_column(mut self, name: &str, sql_type: SqlType, constraints: &str) -> Self {
        self.columns
            .push(ColumnDef::new(name, sql_type).with_constraints(constraints));
        self
    }

    /// Creates the table from all staged columns and foreign keys, as one
    /// `CREATE TABLE IF NOT EXISTS` statement.
    pub async fn create_table(self) -> Result<()> {
        if self.intent != SchemaIntent::Create {
            return Err(LiteKitError::Schema(format!(
                "create_table() is only valid for a new-table builder (table '{}')",
                self.table
            )));
        }

        let mut schema = TableSchema::new(&self.table);
        schema.columns = self.columns;
        schema.foreign_keys = self.foreign_keys;

        let sql = schema.create_table_sql(&self.table, true);
        debug!(sql = %sql, "Executing SQL");
        sqlx::query(&sql).execute(&self.pool).await?;

        info!(table = %self.table, "Table created or already exists");
        Ok(())
    }

    /// Appends each staged column to the existing table, one
    /// `ALTER TABLE ... ADD COLUMN` per column.
    ///
    /// Columns are attempted independently: a failure is recorded and the
    /// remaining columns still run. Accumulated failures come back together
    /// after the pass.
    pub async fn add_columns(self) -> Result<()> {
        if self.intent != SchemaIntent::AddColumns {
            return Err(LiteKitError::Schema(format!(
                "add_columns() is only valid for an add-columns builder (table '{}')",
                self.table
            )));
        }

        let mut errors = Vec::new();
        for column in &self.columns {
            let sql = format!(
                "ALTER TABLE {} ADD COLUMN {}",
                quote_ident(&self.table),
                column.to_sql()
            );
            debug!(sql = %sql, "Executing SQL");
            match sqlx::query(&sql).execute(&self.pool).await {
                Ok(_) => {
                    info!(table = %self.table, column = %column.name, "Column added");
                }
                Err(e) => {
                    warn!(table = %self.table, column = %column.name, error = %e, "Failed to add column");
                    errors.push(LiteKitError::Database(e));
                }
            }
        }

        for fk in &self.foreign_keys {
            warn!(
                table = %self.table,
                column = %fk.column,
                "Foreign key constraints cannot be added to an existing table, skipping"
            );
        }

        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(LiteKitError::Multiple(errors)),
        }
    }
}
