//! Applies or reverts exactly one migration per durable unit.

use crate::error::{MigrateError, MigrateResult};
use crate::ledger::Ledger;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use tm_core::Migration;
use tm_db::StepRunner;

/// Which way a step moves the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => write!(f, "up"),
            Direction::Down => write!(f, "down"),
        }
    }
}

/// How far a unit of work got before it stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Begin,
    Script,
    Ledger,
    Commit,
}

/// Runs each step through an engine-owned [`StepRunner`].
///
/// The script and its ledger mutation share one unit: on success both are
/// committed, on failure neither is. Earlier steps are never affected.
pub struct Executor {
    runner: Arc<dyn StepRunner>,
    ledger: Ledger,
}

impl Executor {
    pub fn new(runner: Arc<dyn StepRunner>, ledger: Ledger) -> Self {
        Self { runner, ledger }
    }

    /// Create the ledger table in its own committed unit.
    pub fn ensure_ledger(&self) -> MigrateResult<()> {
        log::debug!("Ensuring ledger table {}", self.ledger.table());
        self.runner
            .run_atomic(&mut |tx| self.ledger.ensure_table(tx))
            .map_err(MigrateError::ledger("create table"))
    }

    /// Applied versions as committed, read in a fresh unit of the runner.
    ///
    /// Unlike a read through a caller context, this never sees a snapshot
    /// taken before earlier steps committed.
    pub fn applied_versions(&self) -> MigrateResult<BTreeSet<i64>> {
        let mut applied = BTreeSet::new();
        self.runner
            .run_atomic(&mut |tx| {
                applied = self.ledger.applied_versions(tx)?;
                Ok(())
            })
            .map_err(MigrateError::ledger("read"))?;
        Ok(applied)
    }

    /// Run the up script, then record the version.
    pub fn apply_step(&self, migration: &Migration) -> MigrateResult<()> {
        self.run_step(migration, Direction::Up)
    }

    /// Run the down script, then remove the version. The ledger row is only
    /// removed after the script succeeds.
    pub fn revert_step(&self, migration: &Migration) -> MigrateResult<()> {
        self.run_step(migration, Direction::Down)
    }

    fn run_step(&self, migration: &Migration, direction: Direction) -> MigrateResult<()> {
        let script = match direction {
            Direction::Up => &migration.up,
            Direction::Down => &migration.down,
        };
        log::info!("Migrating {direction}: {migration}");

        let mut phase = Phase::Begin;
        let outcome = self.runner.run_atomic(&mut |tx| {
            phase = Phase::Script;
            if !is_blank_script(script) {
                tx.execute_batch(script)?;
            }
            phase = Phase::Ledger;
            match direction {
                Direction::Up => {
                    self.ledger
                        .record_applied(tx, migration.version, &migration.name)?
                }
                Direction::Down => self.ledger.record_rolled_back(tx, migration.version)?,
            }
            phase = Phase::Commit;
            Ok(())
        });

        outcome.map_err(|source| {
            log::warn!("Migration {migration} failed while migrating {direction}: {source}");
            match phase {
                Phase::Script => MigrateError::ScriptExecutionError {
                    version: migration.version,
                    name: migration.name.clone(),
                    direction,
                    source,
                },
                Phase::Begin => MigrateError::LedgerError {
                    operation: "begin step",
                    source,
                },
                Phase::Ledger => MigrateError::LedgerError {
                    operation: match direction {
                        Direction::Up => "record applied",
                        Direction::Down => "record rolled back",
                    },
                    source,
                },
                Phase::Commit => MigrateError::LedgerError {
                    operation: "commit step",
                    source,
                },
            }
        })
    }
}

/// True when `script` holds nothing but whitespace and `--` comments.
fn is_blank_script(script: &str) -> bool {
    script
        .lines()
        .map(str::trim)
        .all(|line| line.is_empty() || line.starts_with("--"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tm_db::{DbError, DbResult, DuckDbBackend, QueryContext};

    fn setup() -> (Arc<DuckDbBackend>, Executor) {
        let db = Arc::new(DuckDbBackend::in_memory().unwrap());
        let runner = Arc::new(db.step_runner().unwrap());
        let executor = Executor::new(runner, Ledger::new("schema_migrations"));
        executor.ensure_ledger().unwrap();
        (db, executor)
    }

    fn table_exists(db: &DuckDbBackend, table: &str) -> bool {
        db.query_one(
            "SELECT COUNT(*) FROM information_schema.tables WHERE table_name = ?",
            &[table.into()],
        )
        .unwrap()
        .get_i64(0)
        .unwrap()
            > 0
    }

    /// Runner whose transactions never start.
    struct RefusingRunner;

    impl StepRunner for RefusingRunner {
        fn run_atomic(
            &self,
            _work: &mut dyn FnMut(&dyn QueryContext) -> DbResult<()>,
        ) -> DbResult<()> {
            Err(DbError::TransactionError("BEGIN failed: read-only".into()))
        }
    }

    #[test]
    fn test_apply_and_revert_step() {
        let (db, executor) = setup();
        let ledger = Ledger::new("schema_migrations");
        let m = Migration::new(1, "users", "CREATE TABLE users (id BIGINT)", "DROP TABLE users");

        executor.apply_step(&m).unwrap();
        assert!(table_exists(&db, "users"));
        assert_eq!(ledger.current_version(&*db).unwrap(), 1);

        executor.revert_step(&m).unwrap();
        assert!(!table_exists(&db, "users"));
        assert_eq!(ledger.current_version(&*db).unwrap(), 0);
    }

    #[test]
    fn test_failed_script_rolls_back_and_skips_ledger() {
        let (db, executor) = setup();
        let ledger = Ledger::new("schema_migrations");
        let m = Migration::new(
            1,
            "half",
            "CREATE TABLE half (id BIGINT); CREAT TABLE oops;",
            "",
        );

        let err = executor.apply_step(&m).unwrap_err();
        match err {
            MigrateError::ScriptExecutionError {
                version,
                name,
                direction,
                ..
            } => {
                assert_eq!(version, 1);
                assert_eq!(name, "half");
                assert_eq!(direction, Direction::Up);
            }
            other => panic!("expected ScriptExecutionError, got {other:?}"),
        }
        assert!(!table_exists(&db, "half"));
        assert_eq!(ledger.current_version(&*db).unwrap(), 0);
    }

    #[test]
    fn test_failed_down_keeps_ledger_row() {
        let (db, executor) = setup();
        let ledger = Ledger::new("schema_migrations");
        let m = Migration::new(1, "t", "CREATE TABLE t (id BIGINT)", "DROP TABL t");

        executor.apply_step(&m).unwrap();
        let err = executor.revert_step(&m).unwrap_err();
        assert!(matches!(
            err,
            MigrateError::ScriptExecutionError {
                direction: Direction::Down,
                ..
            }
        ));
        assert_eq!(ledger.current_version(&*db).unwrap(), 1);
        assert!(table_exists(&db, "t"));
    }

    #[test]
    fn test_ledger_conflict_rolls_back_script() {
        let (db, executor) = setup();
        let ledger = Ledger::new("schema_migrations");
        ledger.record_applied(&*db, 1, "already").unwrap();
        let m = Migration::new(1, "dup", "CREATE TABLE dup (id BIGINT)", "");

        let err = executor.apply_step(&m).unwrap_err();
        assert!(
            matches!(
                err,
                MigrateError::LedgerError {
                    operation: "record applied",
                    ..
                }
            ),
            "got {err:?}"
        );
        assert!(!table_exists(&db, "dup"));
    }

    #[test]
    fn test_empty_down_only_removes_row() {
        let (db, executor) = setup();
        let ledger = Ledger::new("schema_migrations");
        let m = Migration::new(1, "noop_down", "CREATE TABLE kept (id BIGINT)", "");

        executor.apply_step(&m).unwrap();
        executor.revert_step(&m).unwrap();
        assert_eq!(ledger.current_version(&*db).unwrap(), 0);
        assert!(table_exists(&db, "kept"));
    }

    #[test]
    fn test_comment_only_script_is_skipped() {
        assert!(is_blank_script("-- 4_add_index: apply\n\n  -- todo\n"));
        assert!(is_blank_script("   \n"));
        assert!(!is_blank_script("-- header\nSELECT 1;"));

        let (db, executor) = setup();
        let m = Migration::new(4, "add_index", "-- 4_add_index: apply\n", "-- revert\n");
        executor.apply_step(&m).unwrap();
        assert_eq!(Ledger::new("schema_migrations").current_version(&*db).unwrap(), 4);
    }

    #[test]
    fn test_applied_versions_ignore_caller_snapshot() {
        let (db, executor) = setup();
        db.execute_batch("BEGIN TRANSACTION").unwrap();
        let ledger = Ledger::new("schema_migrations");
        assert!(ledger.applied_versions(&*db).unwrap().is_empty());

        executor
            .apply_step(&Migration::new(1, "a", "CREATE TABLE a (id BIGINT)", ""))
            .unwrap();
        assert!(ledger.applied_versions(&*db).unwrap().is_empty());
        assert_eq!(
            executor.applied_versions().unwrap().into_iter().collect::<Vec<_>>(),
            vec![1]
        );
        db.execute_batch("ROLLBACK").unwrap();
    }

    #[test]
    fn test_runner_failure_is_ledger_error() {
        let executor = Executor::new(Arc::new(RefusingRunner), Ledger::new("schema_migrations"));
        let m = Migration::new(1, "a", "SELECT 1", "");

        let err = executor.apply_step(&m).unwrap_err();
        assert!(matches!(
            err,
            MigrateError::LedgerError {
                operation: "begin step",
                ..
            }
        ));
        assert!(matches!(
            executor.ensure_ledger().unwrap_err(),
            MigrateError::LedgerError {
                operation: "create table",
                ..
            }
        ));
        assert!(matches!(
            executor.applied_versions().unwrap_err(),
            MigrateError::LedgerError {
                operation: "read",
                ..
            }
        ));
    }
}
