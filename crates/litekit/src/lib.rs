//! Fluent schema migrations and statement builders for SQLite.
//!
//! SQLite has limited ALTER TABLE support: a column cannot be altered or
//! (portably) dropped in place. `litekit` fills that gap with a table
//! rebuild engine — create a new table under a transient name, copy the
//! surviving data, drop the old table, rename the new one into place, all
//! in one transaction — and pairs it with chainable builders for the
//! statements around it.
//!
//! # Architecture
//!
//! - **Schema model** ([`schema`]) - column/table definitions and DDL
//!   rendering
//! - **Introspection** ([`introspect`]) - reads the live schema fresh on
//!   every operation that needs it
//! - **SchemaBuilder** ([`builder`]) - table creation and column addition
//! - **TableRebuilder** ([`rebuild`]) - rename/modify/remove a column by
//!   reconstruction
//! - **QueryBuilder** ([`query`]) - SELECT composition with a fixed clause
//!   order
//! - **Record builders** ([`record`]) - INSERT (single, positional, batch),
//!   UPDATE, DELETE
//! - **ResultSet** ([`result`]) - rows plus column names, with text/CSV/JSON
//!   output
//!
//! # Example
//!
//! ```rust,ignore
//! use litekit::prelude::*;
//!
//! let db = Database::connect("app.db").await?;
//!
//! db.new_table("users")
//!     .primary_key("id", true)
//!     .text_column("name", "NN")
//!     .int_column("age", "")
//!     .create_table()
//!     .await?;
//!
//! db.insert_into("users")
//!     .field("name", "Ada")
//!     .field("age", 36)
//!     .record()
//!     .await?;
//!
//! // SQLite cannot ALTER COLUMN; this rebuilds the table underneath.
//! db.alter_table("users")
//!     .modify_column("age", ColumnDef::real("age_years").not_null())
//!     .apply()
//!     .await?;
//!
//! let adults = db
//!     .select("users")
//!     .fields(&["name"])
//!     .filter("age_years >= ?", vec![Value::from(18.0)])
//!     .sort_by("name", true)
//!     .fetch()
//!     .await?;
//! println!("{adults}");
//! ```

pub mod builder;
pub mod db;
pub mod error;
pub mod introspect;
pub mod query;
pub mod rebuild;
pub mod record;
pub mod result;
pub mod schema;
pub mod value;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::builder::{SchemaBuilder, SchemaIntent};
    pub use crate::db::Database;
    pub use crate::error::{LiteKitError, Result};
    pub use crate::query::{JoinKind, QueryBuilder};
    pub use crate::rebuild::{PendingMutation, TableRebuilder};
    pub use crate::record::{DeleteBuilder, InsertBuilder, UpdateBuilder};
    pub use crate::result::ResultSet;
    pub use crate::schema::{ColumnDef, DefaultValue, ForeignKeyDef, SqlType, TableSchema};
    pub use crate::value::Value;
}

pub use db::Database;
pub use error::{LiteKitError, Result};
pub use result::ResultSet;
pub use schema::ColumnDef;
pub use value::Value;
