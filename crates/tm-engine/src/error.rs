//! Error types for the migration engine.

use crate::executor::Direction;
use thiserror::Error;
use tm_core::CoreError;
use tm_db::DbError;

/// Migration engine errors.
#[derive(Error, Debug)]
pub enum MigrateError {
    /// Missing or invalid constructor input (T001).
    #[error("[T001] Invalid migrator configuration: {0}")]
    ConfigError(String),

    /// Migration source unreadable or structurally invalid (T002).
    #[error("[T002] Failed to load migrations: {0}")]
    LoadError(#[from] CoreError),

    /// Ledger could not be read or written (T003).
    #[error("[T003] Ledger {operation} failed: {source}")]
    LedgerError {
        operation: &'static str,
        #[source]
        source: DbError,
    },

    /// Negative step count or similar caller error (T004).
    #[error("[T004] Invalid argument: {0}")]
    InvalidArgument(String),

    /// A migration script failed; its step was rolled back (T005).
    #[error("[T005] Migration {version}_{name} failed while migrating {direction}: {source}")]
    ScriptExecutionError {
        version: i64,
        name: String,
        direction: Direction,
        #[source]
        source: DbError,
    },
}

/// Result type alias for [`MigrateError`].
pub type MigrateResult<T> = Result<T, MigrateError>;

impl MigrateError {
    pub(crate) fn ledger(operation: &'static str) -> impl FnOnce(DbError) -> Self {
        move |source| MigrateError::LedgerError { operation, source }
    }

    /// Version of the migration whose script failed, if any.
    pub fn failed_version(&self) -> Option<i64> {
        match self {
            MigrateError::ScriptExecutionError { version, .. } => Some(*version),
            _ => None,
        }
    }
}
