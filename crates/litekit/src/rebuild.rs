//! Table rebuild migration engine.
//!
//! SQLite cannot alter or drop a column in place, so a staged shape change
//! is applied with the table recreation strategy: create a new table under a
//! transient name, copy the surviving data across, drop the old table, and
//! rename the new one into place. All four steps run in one transaction —
//! a reader observes either the fully-original or the fully-rebuilt table,
//! never an intermediate state.

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::{debug, error, info};

use crate::error::{LiteKitError, Result};
use crate::introspect;
use crate::schema::{quote_ident, ColumnDef, TableSchema};

/// Suffix for the transient table a rebuild materializes into.
const REBUILD_SUFFIX: &str = "__rebuild";

/// A single staged shape change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PendingMutation {
    /// Rename the table, keeping its column list unchanged.
    RenameTable {
        /// The new table name.
        new_name: String,
    },

    /// Replace one column's full definition, preserving its position.
    ///
    /// Every other column keeps its type, nullability, default, and
    /// primary-key flag verbatim. Modifying the primary-key column is
    /// representable but not guaranteed safe: autoincrement sequence state
    /// is not preserved across a rebuild.
    ModifyColumn {
        /// Name of the column being replaced.
        old_name: String,
        /// Its replacement definition (may carry a new name).
        definition: ColumnDef,
    },

    /// Drop one column, preserving the order of the rest.
    ///
    /// Removing the sole primary-key column is permitted and yields a table
    /// with no primary key.
    RemoveColumn {
        /// Name of the column to drop.
        name: String,
    },
}

/// Applies exactly one [`PendingMutation`] to a live table by
/// reconstruction.
///
/// At most one mutation is staged per builder instance; staging another
/// silently replaces the current one. Dropping the builder before calling
/// [`apply`](Self::apply) costs nothing — no statement has been sent.
#[derive(Debug)]
pub struct TableRebuilder {
    pool: SqlitePool,
    table: String,
    pending: Option<PendingMutation>,
}

impl TableRebuilder {
    pub(crate) fn new(pool: SqlitePool, table: impl Into<String>) -> Self {
        Self {
            pool,
            table: table.into(),
            pending: None,
        }
    }

    /// Stages a table rename.
    #[must_use]
    pub fn rename_table(self, new_name: &str) -> Self {
        self.stage(PendingMutation::RenameTable {
            new_name: new_name.to_string(),
        })
    }

    /// Stages a column replacement: `old_name` is swapped for `definition`,
    /// which may also rename the column.
    #[must_use]
    pub fn modify_column(self, old_name: &str, definition: ColumnDef) -> Self {
        self.stage(PendingMutation::ModifyColumn {
            old_name: old_name.to_string(),
            definition,
        })
    }

    /// Stages a column removal.
    #[must_use]
    pub fn remove_column(self, name: &str) -> Self {
        self.stage(PendingMutation::RemoveColumn {
            name: name.to_string(),
        })
    }

    fn stage(mut self, mutation: PendingMutation) -> Self {
        if let Some(ref previous) = self.pending {
            debug!(table = %self.table, ?previous, "Replacing staged mutation");
        }
        self.pending = Some(mutation);
        self
    }

    /// Rebuilds the table under the staged mutation.
    ///
    /// The live schema is introspected fresh at this point, then the
    /// create / copy / drop / rename sequence runs inside one transaction.
    /// On any step failure the transaction is rolled back and the original
    /// table is left exactly as it was.
    pub async fn apply(self) -> Result<()> {
        let Some(mutation) = self.pending else {
            return Err(LiteKitError::Schema(format!(
                "no mutation staged for table '{}'",
                self.table
            )));
        };

        let live = introspect::table_schema(&self.pool, &self.table).await?;
        let (new_schema, final_name, projection) = derive_new_schema(&live, &mutation)?;

        let transient = format!("{}{}", self.table, REBUILD_SUFFIX);
        let new_cols: Vec<String> = projection.iter().map(|(_, n)| quote_ident(n)).collect();
        let old_cols: Vec<String> = projection.iter().map(|(o, _)| quote_ident(o)).collect();

        let steps = [
            new_schema.create_table_sql(&transient, false),
            format!(
                "INSERT INTO {} ({}) SELECT {} FROM {}",
                quote_ident(&transient),
                new_cols.join(", "),
                old_cols.join(", "),
                quote_ident(&self.table)
            ),
            format!("DROP TABLE {}", quote_ident(&self.table)),
            format!(
                "ALTER TABLE {} RENAME TO {}",
                quote_ident(&transient),
                quote_ident(&final_name)
            ),
        ];

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| LiteKitError::Migration {
                table: self.table.clone(),
                source: e,
            })?;

        for sql in &steps {
            debug!(sql = %sql, "Executing rebuild step");
            if let Err(e) = sqlx::query(sql).execute(&mut *tx).await {
                error!(table = %self.table, error = %e, "Rebuild step failed, rolling back");
                if let Err(rollback_err) = tx.rollback().await {
                    error!(table = %self.table, error = %rollback_err, "Rollback failed");
                }
                return Err(LiteKitError::Migration {
                    table: self.table,
                    source: e,
                });
            }
        }

        tx.commit().await.map_err(|e| LiteKitError::Migration {
            table: self.table.clone(),
            source: e,
        })?;

        info!(table = %self.table, result = %final_name, "Table rebuilt");
        Ok(())
    }
}

/// Derives the post-mutation schema, the name the rebuilt table ends up
/// under, and the `(old column, new column)` copy projection covering every
/// surviving column.
fn derive_new_schema(
    live: &TableSchema,
    mutation: &PendingMutation,
) -> Result<(TableSchema, String, Vec<(String, String)>)> {
    match mutation {
        PendingMutation::RenameTable { new_name } => {
            let mut schema = live.clone();
            schema.name = new_name.clone();
            let projection = live
                .columns
                .iter()
                .map(|c| (c.name.clone(), c.name.clone()))
                .collect();
            Ok((schema, new_name.clone(), projection))
        }

        PendingMutation::ModifyColumn {
            old_name,
            definition,
        } => {
            if live.get_column(old_name).is_none() {
                return Err(LiteKitError::Schema(format!(
                    "column '{}' does not exist in table '{}'",
                    old_name, live.name
                )));
            }

            let mut schema = TableSchema::new(&live.name);
            let mut projection = Vec::with_capacity(live.columns.len());
            for column in &live.columns {
                if column.name == *old_name {
                    projection.push((old_name.clone(), definition.name.clone()));
                    schema.columns.push(definition.clone());
                } else {
                    projection.push((column.name.clone(), column.name.clone()));
                    schema.columns.push(column.clone());
                }
            }
            // Foreign keys on the modified column follow its rename.
            schema.foreign_keys = live
                .foreign_keys
                .iter()
                .cloned()
                .map(|mut fk| {
                    if fk.column == *old_name {
                        fk.column = definition.name.clone();
                    }
                    fk
                })
                .collect();
            Ok((schema, live.name.clone(), projection))
        }

        PendingMutation::RemoveColumn { name } => {
            if live.get_column(name).is_none() {
                return Err(LiteKitError::Schema(format!(
                    "column '{}' does not exist in table '{}'",
                    name, live.name
                )));
            }

            let mut schema = TableSchema::new(&live.name);
            let mut projection = Vec::with_capacity(live.columns.len() - 1);
            for column in &live.columns {
                if column.name != *name {
                    projection.push((column.name.clone(), column.name.clone()));
                    schema.columns.push(column.clone());
                }
            }
            // A foreign key loses its column, it goes with it.
            schema.foreign_keys = live
                .foreign_keys
                .iter()
                .filter(|fk| fk.column != *name)
                .cloned()
                .collect();
            Ok((schema, live.name.clone(), projection))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{DefaultValue, ForeignKeyDef};

    fn sample_schema() -> TableSchema {
        TableSchema::new("users")
            .column(ColumnDef::integer("id").primary_key().autoincrement())
            .column(ColumnDef::text("name").not_null())
            .column(
                ColumnDef::integer("age").default_value(DefaultValue::Integer(0)),
            )
            .column(ColumnDef::integer("team_id"))
            .foreign_key(ForeignKeyDef::new("team_id", "teams", "id"))
    }

    #[test]
    fn test_rename_keeps_columns_and_maps_identity() {
        let live = sample_schema();
        let mutation = PendingMutation::RenameTable {
            new_name: "people".to_string(),
        };

        let (schema, final_name, projection) = derive_new_schema(&live, &mutation).unwrap();
        assert_eq!(final_name, "people");
        assert_eq!(schema.columns, live.columns);
        assert!(projection.iter().all(|(old, new)| old == new));
        assert_eq!(projection.len(), 4);
    }

    #[test]
    fn test_modify_preserves_position_and_other_columns() {
        let live = sample_schema();
        let mutation = PendingMutation::ModifyColumn {
            old_name: "age".to_string(),
            definition: ColumnDef::text("age_label").not_null(),
        };

        let (schema, final_name, projection) = derive_new_schema(&live, &mutation).unwrap();
        assert_eq!(final_name, "users");
        assert_eq!(
            schema.column_names(),
            vec!["id", "name", "age_label", "team_id"]
        );
        // Untouched columns keep their definitions verbatim.
        assert_eq!(schema.columns[0], live.columns[0]);
        assert_eq!(schema.columns[1], live.columns[1]);
        assert_eq!(schema.columns[3], live.columns[3]);
        // Only the modified column maps old to new.
        assert_eq!(
            projection,
            vec![
                ("id".to_string(), "id".to_string()),
                ("name".to_string(), "name".to_string()),
                ("age".to_string(), "age_label".to_string()),
                ("team_id".to_string(), "team_id".to_string()),
            ]
        );
    }

    #[test]
    fn test_modify_renames_foreign_key_column() {
        let live = sample_schema();
        let mutation = PendingMutation::ModifyColumn {
            old_name: "team_id".to_string(),
            definition: ColumnDef::integer("group_id").not_null(),
        };

        let (schema, _, _) = derive_new_schema(&live, &mutation).unwrap();
        assert_eq!(schema.foreign_keys.len(), 1);
        assert_eq!(schema.foreign_keys[0].column, "group_id");
        assert_eq!(schema.foreign_keys[0].references_table, "teams");
    }

    #[test]
    fn test_remove_drops_column_and_its_foreign_key() {
        let live = sample_schema();
        let mutation = PendingMutation::RemoveColumn {
            name: "team_id".to_string(),
        };

        let (schema, _, projection) = derive_new_schema(&live, &mutation).unwrap();
        assert_eq!(schema.column_names(), vec!["id", "name", "age"]);
        assert!(schema.foreign_keys.is_empty());
        assert!(!projection.iter().any(|(old, _)| old == "team_id"));
    }

    #[test]
    fn test_unknown_column_is_a_schema_error() {
        let live = sample_schema();
        let mutation = PendingMutation::RemoveColumn {
            name: "missing".to_string(),
        };
        assert!(matches!(
            derive_new_schema(&live, &mutation),
            Err(LiteKitError::Schema(_))
        ));

        let mutation = PendingMutation::ModifyColumn {
            old_name: "missing".to_string(),
            definition: ColumnDef::text("x"),
        };
        assert!(matches!(
            derive_new_schema(&live, &mutation),
            Err(LiteKitError::Schema(_))
        ));
    }

    #[tokio::test]
    async fn test_staging_replaces_previous_mutation() {
        // Lazy pool: never connected, staging sends nothing.
        let pool = SqlitePool::connect_lazy(":memory:").expect("lazy pool");
        let builder = TableRebuilder::new(pool, "t")
            .remove_column("a")
            .rename_table("renamed");
        assert_eq!(
            builder.pending,
            Some(PendingMutation::RenameTable {
                new_name: "renamed".to_string()
            })
        );
    }
}
