//! Error types for the schema and statement layer.

/// Errors that can occur while building schemas or executing statements.
#[derive(Debug, thiserror::Error)]
pub enum LiteKitError {
    /// The database file could not be opened or reached.
    #[error("Could not connect to database '{path}': {source}")]
    Connection {
        /// Path or URL that was being opened.
        path: String,
        /// Driver-level cause.
        #[source]
        source: sqlx::Error,
    },

    /// An illegal mutation shape, caught before any statement is sent.
    ///
    /// Covers wrong terminal operations for a builder's declared intent and
    /// column references that do not resolve against the live table.
    #[error("Schema error: {0}")]
    Schema(String),

    /// A step of the table rebuild sequence failed.
    ///
    /// The rebuild transaction has been rolled back; the original table is
    /// untouched.
    #[error("Rebuild of table '{table}' failed: {source}")]
    Migration {
        /// Table that was being rebuilt.
        table: String,
        /// The statement-level failure that aborted the rebuild.
        #[source]
        source: sqlx::Error,
    },

    /// The engine rejected a SELECT statement.
    #[error("Query on '{table}' failed: {source}")]
    Query {
        /// Table the query was scoped to.
        table: String,
        /// Driver-level cause.
        #[source]
        source: sqlx::Error,
    },

    /// A staged row does not fit the target table's column list.
    #[error("Data error: {0}")]
    Data(String),

    /// Any other engine-level failure, forwarded as-is.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Multiple independent failures occurred.
    #[error("Multiple errors occurred:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    Multiple(Vec<LiteKitError>),
}

/// Result type for schema and statement operations.
pub type Result<T> = std::result::Result<T, LiteKitError>;
