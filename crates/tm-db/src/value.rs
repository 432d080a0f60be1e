//! Driver-independent values and rows.
//!
//! The engine never sees driver types: parameters go in as [`Value`]s and
//! result rows come back as [`Row`]s.

use crate::error::{DbError, DbResult};
use std::fmt;

/// A single SQL parameter or column value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Null,
    Integer(i64),
    Text(String),
}

impl Value {
    fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Integer(_) => "INTEGER",
            Value::Text(_) => "TEXT",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Integer(n) => write!(f, "{n}"),
            Value::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// One result row, columns in select-list order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Row(Vec<Value>);

impl Row {
    pub fn new(values: Vec<Value>) -> Self {
        Self(values)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn values(&self) -> &[Value] {
        &self.0
    }

    /// Column `index` as an integer.
    pub fn get_i64(&self, index: usize) -> DbResult<i64> {
        match self.0.get(index) {
            Some(Value::Integer(n)) => Ok(*n),
            other => Err(column_type_error(index, "INTEGER", other)),
        }
    }

    /// Column `index` as text.
    pub fn get_str(&self, index: usize) -> DbResult<&str> {
        match self.0.get(index) {
            Some(Value::Text(s)) => Ok(s),
            other => Err(column_type_error(index, "TEXT", other)),
        }
    }
}

fn column_type_error(index: usize, expected: &'static str, found: Option<&Value>) -> DbError {
    DbError::ColumnType {
        index,
        expected,
        found: found.map_or("no such column", Value::type_name).to_string(),
    }
}
