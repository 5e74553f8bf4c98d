//! Schema data model and DDL rendering.
//!
//! These types describe the shape of a table: what the caller stages through
//! the builders, and what introspection reads back from the live database.
//! Rendering produces SQLite DDL text; values flowing through DML statements
//! are bound as parameters instead (see [`crate::value`]).

use serde::{Deserialize, Serialize};

/// Quotes an identifier (table name, column name, etc.).
///
/// Embedded quote characters are doubled, so caller-supplied names cannot
/// break out of the quoted position.
#[must_use]
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// SQL data types supported by the column builders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SqlType {
    /// UTF-8 text.
    Text,
    /// 64-bit integer.
    Integer,
    /// Floating point.
    Real,
    /// Calendar date, stored as ISO-8601 TEXT with DATE affinity.
    Date,
}

impl SqlType {
    /// Returns the SQLite type name.
    #[must_use]
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Text => "TEXT",
            Self::Integer => "INTEGER",
            Self::Real => "REAL",
            Self::Date => "DATE",
        }
    }

    /// Maps a declared column type from `PRAGMA table_info` into the type
    /// model, following SQLite's affinity rules.
    ///
    /// Tables created through this layer round-trip exactly; columns from
    /// foreign DDL land on the nearest affinity (unknown types behave as
    /// TEXT).
    #[must_use]
    pub fn from_declared(declared: &str) -> Self {
        let upper = declared.to_uppercase();
        if upper.contains("INT") {
            Self::Integer
        } else if upper.contains("DATE") {
            Self::Date
        } else if upper.contains("REAL") || upper.contains("FLOA") || upper.contains("DOUB") {
            Self::Real
        } else {
            Self::Text
        }
    }
}

/// Default value for a column.
///
/// Defaults are schema, not bound parameters: they are embedded in DDL text.
/// `Text` escapes the quote delimiter by doubling; `Expression` is embedded
/// verbatim and must already be valid SQL (it is what introspection returns
/// for an existing default).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DefaultValue {
    /// NULL default.
    Null,
    /// Integer literal.
    Integer(i64),
    /// Float literal.
    Real(f64),
    /// String literal, escaped on render.
    Text(String),
    /// Raw SQL expression (e.g. `CURRENT_TIMESTAMP`).
    Expression(String),
}

impl DefaultValue {
    /// Returns the DDL representation of this default.
    #[must_use]
    pub fn to_sql(&self) -> String {
        match self {
            Self::Null => "NULL".to_string(),
            Self::Integer(i) => i.to_string(),
            Self::Real(f) => f.to_string(),
            Self::Text(s) => format!("'{}'", s.replace('\'', "''")),
            Self::Expression(expr) => expr.clone(),
        }
    }
}

/// Definition of a single column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDef {
    /// Column name.
    pub name: String,
    /// SQL data type.
    pub sql_type: SqlType,
    /// NOT NULL constraint.
    pub not_null: bool,
    /// UNIQUE constraint.
    pub unique: bool,
    /// Default value, if any.
    pub default: Option<DefaultValue>,
    /// Whether this column is the primary key.
    pub primary_key: bool,
    /// Whether the primary key auto-increments.
    pub autoincrement: bool,
}

impl ColumnDef {
    /// Creates a new column definition.
    #[must_use]
    pub fn new(name: impl Into<String>, sql_type: SqlType) -> Self {
        Self {
            name: name.into(),
            sql_type,
            not_null: false,
            unique: false,
            default: None,
            primary_key: false,
            autoincrement: false,
        }
    }

    /// Creates a TEXT column.
    #[must_use]
    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, SqlType::Text)
    }

    /// Creates an INTEGER column.
    #[must_use]
    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, SqlType::Integer)
    }

    /// Creates a REAL column.
    #[must_use]
    pub fn real(name: impl Into<String>) -> Self {
        Self::new(name, SqlType::Real)
    }

    /// Creates a DATE column.
    #[must_use]
    pub fn date(name: impl Into<String>) -> Self {
        Self::new(name, SqlType::Date)
    }

    /// Sets the column as NOT NULL.
    #[must_use]
    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    /// Sets the column as UNIQUE.
    #[must_use]
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn default_value(mut self, value: DefaultValue) -> Self {
        self.default = Some(value);
        self
    }

    /// Sets the column as the primary key.
    #[must_use]
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Sets the primary key to auto-increment.
    #[must_use]
    pub fn autoincrement(mut self) -> Self {
        self.autoincrement = true;
        self
    }

    /// Applies constraints from a caller-supplied token string.
    ///
    /// The vocabulary is `NN`/`NOT NULL` and `UQ`/`UNIQUE`, detected
    /// case-insensitively. Anything else in the string is ignored; lenient
    /// parsing is the contract, not an error.
    #[must_use]
    pub fn with_constraints(mut self, constraints: &str) -> Self {
        let upper = constraints.to_uppercase();
        if upper.contains("NN") || upper.contains("NOT NULL") {
            self.not_null = true;
        }
        if upper.contains("UQ") || upper.contains("UNIQUE") {
            self.unique = true;
        }
        self
    }

    /// Renders the column definition as DDL.
    #[must_use]
    pub fn to_sql(&self) -> String {
        let mut parts = vec![quote_ident(&self.name), self.sql_type.as_sql().to_string()];

        if self.primary_key {
            parts.push("PRIMARY KEY".to_string());
            if self.autoincrement {
                parts.push("AUTOINCREMENT".to_string());
            }
        }

        if self.not_null && !self.primary_key {
            parts.push("NOT NULL".to_string());
        }

        if self.unique && !self.primary_key {
            parts.push("UNIQUE".to_string());
        }

        if let Some(ref default) = self.default {
            parts.push(format!("DEFAULT {}", default.to_sql()));
        }

        parts.join(" ")
    }
}

/// A referential constraint from one column to another table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyDef {
    /// Column in the referencing table.
    pub column: String,
    /// Referenced table name.
    pub references_table: String,
    /// Referenced column name.
    pub references_column: String,
    /// ON UPDATE action, when one was declared.
    pub on_update: Option<String>,
    /// ON DELETE action, when one was declared.
    pub on_delete: Option<String>,
}

impl ForeignKeyDef {
    /// Creates a foreign key definition with default actions.
    #[must_use]
    pub fn new(
        column: impl Into<String>,
        references_table: impl Into<String>,
        references_column: impl Into<String>,
    ) -> Self {
        Self {
            column: column.into(),
            references_table: references_table.into(),
            references_column: references_column.into(),
            on_update: None,
            on_delete: None,
        }
    }

    /// Renders the foreign key clause as DDL.
    #[must_use]
    pub fn to_sql(&self) -> String {
        let mut sql = format!(
            "FOREIGN KEY ({}) REFERENCES {}({})",
            quote_ident(&self.column),
            quote_ident(&self.references_table),
            quote_ident(&self.references_column)
        );
        if let Some(ref action) = self.on_update {
            if action != "NO ACTION" {
                sql.push_str(&format!(" ON UPDATE {}", action));
            }
        }
        if let Some(ref action) = self.on_delete {
            if action != "NO ACTION" {
                sql.push_str(&format!(" ON DELETE {}", action));
            }
        }
        sql
    }
}

/// The full shape of a table: ordered columns plus foreign keys.
///
/// Column order is significant — it is positional insert order and governs
/// `row()`-style value mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    /// Table name.
    pub name: String,
    /// Column definitions, in declaration order.
    pub columns: Vec<ColumnDef>,
    /// Foreign key constraints.
    pub foreign_keys: Vec<ForeignKeyDef>,
}

impl TableSchema {
    /// Creates an empty table schema.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            foreign_keys: Vec::new(),
        }
    }

    /// Adds a column.
    #[must_use]
    pub fn column(mut self, column: ColumnDef) -> Self {
        self.columns.push(column);
        self
    }

    /// Adds a foreign key.
    #[must_use]
    pub fn foreign_key(mut self, fk: ForeignKeyDef) -> Self {
        self.foreign_keys.push(fk);
        self
    }

    /// Gets a column by name.
    #[must_use]
    pub fn get_column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Returns column names in declaration order.
    #[must_use]
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Renders a CREATE TABLE statement for this schema under `table_name`.
    ///
    /// The name is a parameter because the rebuild path materializes the
    /// schema under a transient name before renaming it into place.
    #[must_use]
    pub fn create_table_sql(&self, table_name: &str, if_not_exists: bool) -> String {
        let mut sql = String::from("CREATE TABLE ");
        if if_not_exists {
            sql.push_str("IF NOT EXISTS ");
        }
        sql.push_str(&quote_ident(table_name));
        sql.push_str(" (");

        let mut defs: Vec<String> = self.columns.iter().map(ColumnDef::to_sql).collect();
        defs.extend(self.foreign_keys.iter().map(ForeignKeyDef::to_sql));
        sql.push_str(&defs.join(", "));

        sql.push(')');
        sql
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_def_builder() {
        let col = ColumnDef::integer("id").primary_key().autoincrement();

        assert_eq!(col.name, "id");
        assert!(col.primary_key);
        assert!(col.autoincrement);
        assert_eq!(col.to_sql(), "\"id\" INTEGER PRIMARY KEY AUTOINCREMENT");
    }

    #[test]
    fn test_column_def_constraints_and_default() {
        let col = ColumnDef::text("email")
            .not_null()
            .unique()
            .default_value(DefaultValue::Text("none".into()));

        assert_eq!(
            col.to_sql(),
            "\"email\" TEXT NOT NULL UNIQUE DEFAULT 'none'"
        );
    }

    #[test]
    fn test_constraint_tokens_are_case_insensitive() {
        let col = ColumnDef::text("name").with_constraints("nn uq");
        assert!(col.not_null);
        assert!(col.unique);

        let col = ColumnDef::text("name").with_constraints("NOT NULL");
        assert!(col.not_null);
        assert!(!col.unique);
    }

    #[test]
    fn test_unknown_constraint_tokens_are_ignored() {
        let col = ColumnDef::text("name").with_constraints("CHECK(length(name) > 3)");
        assert!(!col.not_null);
        assert!(!col.unique);
    }

    #[test]
    fn test_string_default_escapes_quote_delimiter() {
        let default = DefaultValue::Text("it's', 0); DROP TABLE users;--".into());
        assert_eq!(
            default.to_sql(),
            "'it''s'', 0); DROP TABLE users;--'"
        );
    }

    #[test]
    fn test_quote_ident_doubles_embedded_quotes() {
        assert_eq!(quote_ident("plain"), "\"plain\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn test_sql_type_from_declared() {
        assert_eq!(SqlType::from_declared("INTEGER"), SqlType::Integer);
        assert_eq!(SqlType::from_declared("int"), SqlType::Integer);
        assert_eq!(SqlType::from_declared("VARCHAR(40)"), SqlType::Text);
        assert_eq!(SqlType::from_declared("DOUBLE"), SqlType::Real);
        assert_eq!(SqlType::from_declared("DATE"), SqlType::Date);
        assert_eq!(SqlType::from_declared("NUMERIC"), SqlType::Text);
    }

    #[test]
    fn test_create_table_sql() {
        let schema = TableSchema::new("orders")
            .column(ColumnDef::integer("id").primary_key().autoincrement())
            .column(ColumnDef::text("item").not_null())
            .column(ColumnDef::integer("customer_id"))
            .foreign_key(ForeignKeyDef::new("customer_id", "customers", "id"));

        assert_eq!(
            schema.create_table_sql("orders", true),
            "CREATE TABLE IF NOT EXISTS \"orders\" (\
             \"id\" INTEGER PRIMARY KEY AUTOINCREMENT, \
             \"item\" TEXT NOT NULL, \
             \"customer_id\" INTEGER, \
             FOREIGN KEY (\"customer_id\") REFERENCES \"customers\"(\"id\"))"
        );
    }

    #[test]
    fn test_foreign_key_actions_rendered_when_declared() {
        let mut fk = ForeignKeyDef::new("user_id", "users", "id");
        fk.on_delete = Some("CASCADE".to_string());
        fk.on_update = Some("NO ACTION".to_string());

        assert_eq!(
            fk.to_sql(),
            "FOREIGN KEY (\"user_id\") REFERENCES \"users\"(\"id\") ON DELETE CASCADE"
        );
    }
}
