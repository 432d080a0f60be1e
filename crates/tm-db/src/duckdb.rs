//! DuckDB database backend implementation

use crate::error::{DbError, DbResult};
use crate::traits::{QueryContext, StepRunner};
use crate::value::{Row, Value};
use ::duckdb::types::{ToSql, ToSqlOutput, Value as DuckValue};
use ::duckdb::Connection;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// DuckDB database backend
///
/// Implements [`QueryContext`] on its own connection, in whatever
/// transaction state the owner leaves it.
pub struct DuckDbBackend {
    conn: Mutex<Connection>,
}

/// Step runner with a dedicated connection to the same database.
///
/// Created by [`DuckDbBackend::step_runner`]. Its transactions are
/// independent of anything open on the backend's connection.
pub struct DuckDbStepRunner {
    conn: Mutex<Connection>,
}

/// A [`QueryContext`] bound to an open `BEGIN` on a runner connection.
struct TransactionContext<'a> {
    conn: &'a Connection,
}

impl DuckDbBackend {
    /// Create a new in-memory DuckDB connection
    pub fn in_memory() -> DbResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create a new DuckDB connection from a file path
    pub fn from_path(path: &Path) -> DbResult<Self> {
        let conn = Connection::open(path)
            .map_err(|e| DbError::ConnectionError(format!("{e}: {}", path.display())))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create from path string (handles :memory: special case)
    pub fn new(path: &str) -> DbResult<Self> {
        if path == ":memory:" {
            Self::in_memory()
        } else {
            Self::from_path(Path::new(path))
        }
    }

    /// Open a second connection to this database for independent units of
    /// work. Works for in-memory databases too.
    pub fn step_runner(&self) -> DbResult<DuckDbStepRunner> {
        let conn = self
            .connection()?
            .try_clone()
            .map_err(|e| DbError::ConnectionError(format!("failed to clone connection: {e}")))?;
        Ok(DuckDbStepRunner {
            conn: Mutex::new(conn),
        })
    }

    fn connection(&self) -> DbResult<MutexGuard<'_, Connection>> {
        lock(&self.conn)
    }
}

impl QueryContext for DuckDbBackend {
    fn execute(&self, sql: &str, params: &[Value]) -> DbResult<usize> {
        execute_on(&*self.connection()?, sql, params)
    }

    fn execute_batch(&self, sql: &str) -> DbResult<()> {
        self.connection()?.execute_batch(sql)?;
        Ok(())
    }

    fn query(&self, sql: &str, params: &[Value]) -> DbResult<Vec<Row>> {
        query_on(&*self.connection()?, sql, params)
    }

    fn db_type(&self) -> &'static str {
        "duckdb"
    }
}

impl StepRunner for DuckDbStepRunner {
    fn run_atomic(
        &self,
        work: &mut dyn FnMut(&dyn QueryContext) -> DbResult<()>,
    ) -> DbResult<()> {
        let conn = lock(&self.conn)?;
        conn.execute_batch("BEGIN TRANSACTION")
            .map_err(|e| DbError::TransactionError(format!("BEGIN failed: {e}")))?;

        let result = work(&TransactionContext { conn: &*conn });

        match &result {
            Ok(()) => {
                if let Err(commit_err) = conn.execute_batch("COMMIT") {
                    let _ = conn.execute_batch("ROLLBACK");
                    return Err(DbError::TransactionError(format!(
                        "COMMIT failed: {commit_err}"
                    )));
                }
            }
            Err(_) => {
                if let Err(rollback_err) = conn.execute_batch("ROLLBACK") {
                    log::warn!("ROLLBACK after failed unit of work also failed: {rollback_err}");
                }
            }
        }
        result
    }
}

impl QueryContext for TransactionContext<'_> {
    fn execute(&self, sql: &str, params: &[Value]) -> DbResult<usize> {
        execute_on(self.conn, sql, params)
    }

    fn execute_batch(&self, sql: &str) -> DbResult<()> {
        self.conn.execute_batch(sql)?;
        Ok(())
    }

    fn query(&self, sql: &str, params: &[Value]) -> DbResult<Vec<Row>> {
        query_on(self.conn, sql, params)
    }

    fn db_type(&self) -> &'static str {
        "duckdb"
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> ::duckdb::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Owned(DuckValue::Null),
            Value::Integer(n) => ToSqlOutput::Owned(DuckValue::BigInt(*n)),
            Value::Text(s) => ToSqlOutput::Owned(DuckValue::Text(s.clone())),
        })
    }
}

fn lock(conn: &Mutex<Connection>) -> DbResult<MutexGuard<'_, Connection>> {
    conn.lock()
        .map_err(|_| DbError::MutexPoisoned("duckdb connection lock poisoned".into()))
}

fn execute_on(conn: &Connection, sql: &str, params: &[Value]) -> DbResult<usize> {
    let params: Vec<&dyn ToSql> = params.iter().map(|v| v as &dyn ToSql).collect();
    Ok(conn.execute(sql, params.as_slice())?)
}

fn query_on(conn: &Connection, sql: &str, params: &[Value]) -> DbResult<Vec<Row>> {
    let params: Vec<&dyn ToSql> = params.iter().map(|v| v as &dyn ToSql).collect();
    let mut stmt = conn.prepare(sql)?;
    // Column metadata is only reliable once the statement has executed, so
    // the count is read per row.
    let rows = stmt
        .query_map(params.as_slice(), |row| {
            let column_count = row.as_ref().column_count();
            Ok(Row::new(
                (0..column_count).map(|i| read_value(row, i)).collect(),
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Read a column as an integer, then as text, falling back to NULL.
fn read_value(row: &::duckdb::Row<'_>, idx: usize) -> Value {
    if let Ok(Some(n)) = row.get::<_, Option<i64>>(idx) {
        return Value::Integer(n);
    }
    if let Ok(Some(s)) = row.get::<_, Option<String>>(idx) {
        return Value::Text(s);
    }
    Value::Null
}

#[cfg(test)]
#[path = "duckdb_test.rs"]
mod tests;
