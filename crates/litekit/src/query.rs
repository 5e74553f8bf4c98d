//! Fluent SELECT construction.

use sqlx::SqlitePool;
use tracing::{debug, warn};

use crate::error::{LiteKitError, Result};
use crate::result::ResultSet;
use crate::schema::quote_ident;
use crate::value::{decode_rows, Value};

/// Join kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    /// INNER JOIN.
    Inner,
    /// LEFT JOIN.
    Left,
}

impl JoinKind {
    fn as_sql(self) -> &'static str {
        match self {
            Self::Inner => "INNER JOIN",
            Self::Left => "LEFT JOIN",
        }
    }
}

#[derive(Debug, Clone)]
struct JoinClause {
    table: String,
    condition: String,
    kind: JoinKind,
}

/// Incrementally composes a SELECT statement.
///
/// Staging calls may arrive in any order; the rendered statement always
/// follows the fixed clause order `SELECT fields FROM table [joins]
/// [WHERE] [GROUP BY] [ORDER BY] [LIMIT]`.
#[derive(Debug)]
pub struct QueryBuilder {
    pool: SqlitePool,
    table: String,
    fields: Vec<String>,
    joins: Vec<JoinClause>,
    predicates: Vec<String>,
    params: Vec<Value>,
    group_by: Vec<String>,
    sort: Option<(String, bool)>,
    limit: Option<i64>,
}

impl QueryBuilder {
    pub(crate) fn new(pool: SqlitePool, table: impl Into<String>) -> Self {
        Self {
            pool,
            table: table.into(),
            fields: Vec::new(),
            joins: Vec::new(),
            predicates: Vec::new(),
            params: Vec::new(),
            group_by: Vec::new(),
            sort: None,
            limit: None,
        }
    }

    /// Sets the projection, replacing the default `*`. Last call wins.
    #[must_use]
    pub fn fields(mut self, fields: &[&str]) -> Self {
        if !fields.is_empty() {
            self.fields = fields.iter().map(|f| (*f).to_string()).collect();
        }
        self
    }

    /// Appends a predicate fragment and its positional parameters.
    ///
    /// Fragments are ANDed in the order they are added; parameters line up
    /// with the `?` placeholders of their own fragment.
    #[must_use]
    pub fn filter(mut self, clause: &str, params: Vec<Value>) -> Self {
        self.predicates.push(clause.to_string());
        self.params.extend(params);
        self
    }

    /// Appends an INNER JOIN. The condition is raw text, not parameterized.
    #[must_use]
    pub fn join(mut self, table: &str, condition: &str) -> Self {
        self.joins.push(JoinClause {
            table: table.to_string(),
            condition: condition.to_string(),
            kind: JoinKind::Inner,
        });
        self
    }

    /// Appends a LEFT JOIN.
    #[must_use]
    pub fn left_join(mut self, table: &str, condition: &str) -> Self {
        self.joins.push(JoinClause {
            table: table.to_string(),
            condition: condition.to_string(),
            kind: JoinKind::Left,
        });
        self
    }

    /// Accumulates GROUP BY columns across calls (additive, unlike
    /// [`fields`](Self::fields)).
    #[must_use]
    pub fn group_by(mut self, columns: &[&str]) -> Self {
        self.group_by
            .extend(columns.iter().map(|c| (*c).to_string()));
        self
    }

    /// Sets the single sort key; a later call overwrites an earlier one.
    /// Ties are left to engine default order.
    #[must_use]
    pub fn sort_by(mut self, column: &str, ascending: bool) -> Self {
        self.sort = Some((column.to_string(), ascending));
        self
    }

    /// Caps the result row count. No offset support.
    #[must_use]
    pub fn limit(mut self, count: i64) -> Self {
        self.limit = Some(count);
        self
    }

    /// Builds the final SQL statement and its parameter list.
    #[must_use]
    pub fn build_select(&self) -> (String, Vec<Value>) {
        let projection = if self.fields.is_empty() {
            "*".to_string()
        } else {
            self.fields.join(", ")
        };
        let mut sql = format!("SELECT {} FROM {}", projection, quote_ident(&self.table));

        for join in &self.joins {
            sql.push_str(&format!(
                " {} {} ON {}",
                join.kind.as_sql(),
                quote_ident(&join.table),
                join.condition
            ));
        }

        if !self.predicates.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.predicates.join(" AND "));
        }

        if !self.group_by.is_empty() {
            sql.push_str(" GROUP BY ");
            sql.push_str(&self.group_by.join(", "));
        }

        if let Some((ref column, ascending)) = self.sort {
            sql.push_str(&format!(
                " ORDER BY {} {}",
                column,
                if ascending { "ASC" } else { "DESC" }
            ));
        }

        if let Some(count) = self.limit {
            sql.push_str(&format!(" LIMIT {count}"));
        }

        (sql, self.params.clone())
    }

    /// Builds, executes, and decodes the statement.
    ///
    /// Failure is a `Query` error carrying the engine's complaint; it is
    /// reported, never panicked on.
    pub async fn fetch(self) -> Result<ResultSet> {
        let (sql, params) = self.build_select();
        debug!(sql = %sql, "Executing SQL");

        let mut query = sqlx::query(&sql);
        for value in params {
            query = value.bind(query);
        }

        let rows = match query.fetch_all(&self.pool).await {
            Ok(rows) => rows,
            Err(e) => {
                warn!(table = %self.table, error = %e, "SELECT failed");
                return Err(LiteKitError::Query {
                    table: self.table,
                    source: e,
                });
            }
        };

        let (columns, data) = decode_rows(&rows)?;
        Ok(ResultSet::new(columns, data))
    }
}
