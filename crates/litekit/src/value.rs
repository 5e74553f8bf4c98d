//! Dynamic values crossing the statement boundary.
//!
//! A [`Value`] is what callers hand to the record builders, what gets bound
//! as a positional parameter, and what result decoding hands back per cell.

use chrono::{NaiveDate, NaiveDateTime};
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{Row, Sqlite, TypeInfo, ValueRef};
use std::fmt;

use crate::error::Result;

/// A dynamically typed SQL value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// NULL.
    Null,
    /// 64-bit integer. Booleans are carried as 0/1.
    Integer(i64),
    /// Floating point.
    Real(f64),
    /// UTF-8 text. Dates are carried as ISO-8601 text.
    Text(String),
    /// Binary blob.
    Blob(Vec<u8>),
}

impl Value {
    /// Attaches this value to a prepared statement as the next positional
    /// parameter.
    pub(crate) fn bind<'q>(
        self,
        query: Query<'q, Sqlite, SqliteArguments<'q>>,
    ) -> Query<'q, Sqlite, SqliteArguments<'q>> {
        match self {
            Self::Null => query.bind(Option::<i64>::None),
            Self::Integer(i) => query.bind(i),
            Self::Real(f) => query.bind(f),
            Self::Text(s) => query.bind(s),
            Self::Blob(b) => query.bind(b),
        }
    }

    /// Converts to a JSON value for the serialization path.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Integer(i) => serde_json::Value::Number((*i).into()),
            Self::Real(f) => serde_json::Number::from_f64(*f)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            Self::Text(s) => serde_json::Value::String(s.clone()),
            Self::Blob(b) => {
                let hex: String = b.iter().map(|byte| format!("{byte:02x}")).collect();
                serde_json::Value::String(hex)
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Real(r) => write!(f, "{r}"),
            Self::Text(s) => write!(f, "{s}"),
            Self::Blob(b) => {
                write!(f, "X'")?;
                for byte in b {
                    write!(f, "{byte:02X}")?;
                }
                write!(f, "'")
            }
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Integer(i64::from(v))
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Integer(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Real(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Self::Blob(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Self::Text(v.format("%Y-%m-%d").to_string())
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Self::Text(v.format("%Y-%m-%d %H:%M:%S").to_string())
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

/// Decodes a fetched row set into column names plus cell values.
///
/// Column names come from the first row; a statement that produced no rows
/// decodes to an empty result.
pub(crate) fn decode_rows(rows: &[SqliteRow]) -> Result<(Vec<String>, Vec<Vec<Value>>)> {
    use sqlx::Column;

    let columns: Vec<String> = rows.first().map_or_else(Vec::new, |row| {
        row.columns().iter().map(|c| c.name().to_string()).collect()
    });
    let mut data = Vec::with_capacity(rows.len());
    for row in rows {
        data.push(decode_row(row)?);
    }
    Ok((columns, data))
}

/// Decodes every cell of a row into a [`Value`], using the storage class the
/// engine reports for each cell.
pub(crate) fn decode_row(row: &SqliteRow) -> Result<Vec<Value>> {
    let mut values = Vec::with_capacity(row.len());
    for index in 0..row.len() {
        let raw = row.try_get_raw(index)?;
        let value = if raw.is_null() {
            Value::Null
        } else {
            match raw.type_info().name().to_ascii_uppercase().as_str() {
                "INTEGER" => Value::Integer(row.try_get(index)?),
                "REAL" => Value::Real(row.try_get(index)?),
                "BLOB" => Value::Blob(row.try_get(index)?),
                _ => Value::Text(row.try_get(index)?),
            }
        };
        values.push(value);
    }
    Ok(values)
}
