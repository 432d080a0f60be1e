//! Error types for tm-db

use thiserror::Error;

/// Database operation errors
#[derive(Error, Debug)]
pub enum DbError {
    /// Connection error (D001)
    #[error("[D001] Database connection failed: {0}")]
    ConnectionError(String),

    /// Query execution error (D002)
    #[error("[D002] SQL execution failed: {0}")]
    ExecutionError(String),

    /// Table not found (D003)
    #[error("[D003] Table or view not found: {0}")]
    TableNotFound(String),

    /// Statement touched or returned the wrong number of rows (D004)
    #[error("[D004] Expected exactly one row, got {actual}: {sql}")]
    UnexpectedRowCount { actual: usize, sql: String },

    /// Column value has an unexpected type (D005)
    #[error("[D005] Column {index} is not {expected}: found {found}")]
    ColumnType {
        index: usize,
        expected: &'static str,
        found: String,
    },

    /// Mutex poisoned (D006)
    #[error("[D006] Database mutex poisoned: {0}")]
    MutexPoisoned(String),

    /// Transaction management error (D007)
    #[error("[D007] Transaction failed: {0}")]
    TransactionError(String),
}

/// Result type alias for DbError
pub type DbResult<T> = Result<T, DbError>;

impl From<duckdb::Error> for DbError {
    fn from(err: duckdb::Error) -> Self {
        // duckdb::Error does not expose structured variants for catalog
        // errors, so missing relations are recognised by message.
        let msg = err.to_string();
        if is_missing_relation(&msg) {
            DbError::TableNotFound(msg)
        } else {
            DbError::ExecutionError(msg)
        }
    }
}

/// Catalog errors about a relation that does not exist, as opposed to
/// one that already does.
fn is_missing_relation(msg: &str) -> bool {
    let names_relation = msg.contains("Table with name")
        || msg.contains("View with name")
        || msg.contains("Table or view with name");
    let is_missing = msg.contains("does not exist") || msg.contains("not found");
    (names_relation || (msg.contains("Catalog Error") && msg.contains("Table"))) && is_missing
}
