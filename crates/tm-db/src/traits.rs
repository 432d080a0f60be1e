//! Data-access capability traits

use crate::error::{DbError, DbResult};
use crate::value::{Row, Value};

/// Statement execution and reads against some connection state.
///
/// A context may be bound to a plain auto-commit connection or to a
/// transaction someone else opened; callers of the trait cannot tell.
pub trait QueryContext {
    /// Execute a single statement, returning the affected row count
    fn execute(&self, sql: &str, params: &[Value]) -> DbResult<usize>;

    /// Execute a single statement that must affect exactly one row
    fn execute_one(&self, sql: &str, params: &[Value]) -> DbResult<()> {
        match self.execute(sql, params)? {
            1 => Ok(()),
            actual => Err(DbError::UnexpectedRowCount {
                actual,
                sql: sql.to_string(),
            }),
        }
    }

    /// Execute a script of one or more statements without parameters
    fn execute_batch(&self, sql: &str) -> DbResult<()>;

    /// Run a query and collect every row
    fn query(&self, sql: &str, params: &[Value]) -> DbResult<Vec<Row>>;

    /// Run a query that must return exactly one row
    fn query_one(&self, sql: &str, params: &[Value]) -> DbResult<Row> {
        let mut rows = self.query(sql, params)?;
        if rows.len() != 1 {
            return Err(DbError::UnexpectedRowCount {
                actual: rows.len(),
                sql: sql.to_string(),
            });
        }
        Ok(rows.remove(0))
    }

    /// Database type identifier for logging
    fn db_type(&self) -> &'static str;
}

/// Runs units of work that commit on their own.
///
/// Every call to [`run_atomic`](StepRunner::run_atomic) opens a fresh
/// transaction on the runner's own connection, never nested in one the
/// caller holds. The unit commits when `work` returns `Ok` and rolls back
/// otherwise.
pub trait StepRunner: Send + Sync {
    fn run_atomic(
        &self,
        work: &mut dyn FnMut(&dyn QueryContext) -> DbResult<()>,
    ) -> DbResult<()>;
}
