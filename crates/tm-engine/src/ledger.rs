//! The applied-version ledger.
//!
//! One row per applied migration in a dedicated table inside the target
//! database. The ledger is the single source of truth for what has been
//! applied; it does not check that its versions exist in the loaded set.

use serde::Serialize;
use std::collections::BTreeSet;
use tm_db::{DbResult, QueryContext, Value};

/// One applied migration as recorded in the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerRecord {
    pub version: i64,
    pub name: String,
}

/// Reads and writes the ledger table through any [`QueryContext`].
#[derive(Debug, Clone)]
pub struct Ledger {
    table: String,
}

impl Ledger {
    /// `table` must already be a validated identifier (see
    /// [`tm_core::config::validate_table_name`]).
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Create the ledger table (and its schema, if qualified) when absent.
    pub fn ensure_table(&self, ctx: &dyn QueryContext) -> DbResult<()> {
        if let Some((schema, _)) = self.table.split_once('.') {
            ctx.execute_batch(&format!("CREATE SCHEMA IF NOT EXISTS {schema}"))?;
        }
        ctx.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {} (
                 version BIGINT PRIMARY KEY,
                 name    VARCHAR NOT NULL
             )",
            self.table
        ))
    }

    /// Highest applied version, or 0 if none.
    pub fn current_version(&self, ctx: &dyn QueryContext) -> DbResult<i64> {
        ctx.query_one(
            &format!("SELECT COALESCE(MAX(version), 0)::BIGINT FROM {}", self.table),
            &[],
        )?
        .get_i64(0)
    }

    pub fn applied_versions(&self, ctx: &dyn QueryContext) -> DbResult<BTreeSet<i64>> {
        ctx.query(&format!("SELECT version FROM {}", self.table), &[])?
            .iter()
            .map(|row| row.get_i64(0))
            .collect()
    }

    /// Every ledger row, ascending by version.
    pub fn applied_records(&self, ctx: &dyn QueryContext) -> DbResult<Vec<LedgerRecord>> {
        ctx.query(
            &format!("SELECT version, name FROM {} ORDER BY version", self.table),
            &[],
        )?
        .iter()
        .map(|row| {
            Ok(LedgerRecord {
                version: row.get_i64(0)?,
                name: row.get_str(1)?.to_string(),
            })
        })
        .collect()
    }

    pub fn record_applied(&self, ctx: &dyn QueryContext, version: i64, name: &str) -> DbResult<()> {
        ctx.execute_one(
            &format!("INSERT INTO {} (version, name) VALUES (?, ?)", self.table),
            &[Value::Integer(version), Value::from(name)],
        )
    }

    pub fn record_rolled_back(&self, ctx: &dyn QueryContext, version: i64) -> DbResult<()> {
        ctx.execute_one(
            &format!("DELETE FROM {} WHERE version = ?", self.table),
            &[Value::Integer(version)],
        )
    }
}

#[cfg(test)]
#[path = "ledger_test.rs"]
mod tests;
