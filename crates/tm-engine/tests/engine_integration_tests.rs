//! End-to-end tests for the migration engine.
//!
//! These tests load the fixture directories under `tests/fixtures/` with the
//! default directory source and migrate real DuckDB databases.

use std::path::Path;
use std::sync::Arc;
use tm_db::{DuckDbBackend, QueryContext, Value};
use tm_engine::{Direction, MigrateError, Migrator, MigratorOptions};

// ── Helpers ────────────────────────────────────────────────────────────

fn open(fixture: &str, db: &Arc<DuckDbBackend>) -> Migrator {
    let options = MigratorOptions::new(Path::new("tests/fixtures").join(fixture))
        .with_runner(Arc::new(db.step_runner().unwrap()))
        .with_context(db.clone());
    Migrator::new(options).unwrap()
}

fn memory_db() -> Arc<DuckDbBackend> {
    Arc::new(DuckDbBackend::in_memory().unwrap())
}

fn table_exists(db: &DuckDbBackend, table: &str) -> bool {
    db.query_one(
        "SELECT COUNT(*) FROM information_schema.tables WHERE table_name = ?",
        &[Value::from(table)],
    )
    .unwrap()
    .get_i64(0)
    .unwrap()
        == 1
}

fn plan_versions(migrator: &Migrator) -> Vec<i64> {
    migrator.plan().unwrap().iter().map(|m| m.version).collect()
}

fn list_versions(migrator: &Migrator) -> Vec<i64> {
    migrator.list().unwrap().iter().map(|r| r.version).collect()
}

// ── Good fixture ───────────────────────────────────────────────────────

#[test]
fn test_good_fixture_loads_in_order() {
    let db = memory_db();
    let migrator = open("good", &db);

    let names: Vec<&str> = migrator
        .migrations()
        .iter()
        .map(|m| m.name.as_str())
        .collect();
    assert_eq!(names, vec!["create_users", "create_posts", "add_user_email"]);
    assert!(migrator.migrations().iter().all(|m| m.has_down()));
}

#[test]
fn test_good_fixture_up_then_partial_down() {
    let db = memory_db();
    let migrator = open("good", &db);

    assert_eq!(migrator.version().unwrap(), 0);
    assert_eq!(plan_versions(&migrator), vec![1, 2, 3]);

    let report = migrator.up(0).unwrap();
    assert_eq!(report.versions, vec![1, 2, 3]);
    assert_eq!(migrator.version().unwrap(), 3);
    assert_eq!(list_versions(&migrator), vec![1, 2, 3]);
    assert!(table_exists(&db, "users"));
    assert!(table_exists(&db, "posts"));

    db.execute(
        "INSERT INTO users (id, name, email) VALUES (?, ?, ?)",
        &[Value::Integer(1), Value::from("ada"), Value::from("ada@example.com")],
    )
    .unwrap();

    let report = migrator.down(2).unwrap();
    assert_eq!(report.direction, Direction::Down);
    assert_eq!(report.versions, vec![3, 2]);
    assert_eq!(migrator.version().unwrap(), 1);
    assert_eq!(list_versions(&migrator), vec![1]);
    assert_eq!(plan_versions(&migrator), vec![2, 3]);
    assert!(table_exists(&db, "users"));
    assert!(!table_exists(&db, "posts"));

    // Data outside the reverted column survives.
    let row = db.query_one("SELECT name FROM users", &[]).unwrap();
    assert_eq!(row.get_str(0).unwrap(), "ada");
}

#[test]
fn test_good_fixture_step_by_step() {
    let db = memory_db();
    let migrator = open("good", &db);

    for expected in 1..=3 {
        assert_eq!(migrator.up(1).unwrap().versions, vec![expected]);
        assert_eq!(migrator.version().unwrap(), expected);
    }
    assert!(migrator.up(1).unwrap().is_empty());

    for expected in (1..=3).rev() {
        assert_eq!(migrator.down(1).unwrap().versions, vec![expected]);
    }
    assert_eq!(migrator.version().unwrap(), 0);
    assert!(!table_exists(&db, "users"));
}

#[test]
fn test_negative_steps_are_rejected() {
    let db = memory_db();
    let migrator = open("good", &db);

    let err = migrator.up(-1).unwrap_err();
    assert!(matches!(err, MigrateError::InvalidArgument(_)), "got {err:?}");
    let err = migrator.down(-1).unwrap_err();
    assert!(matches!(err, MigrateError::InvalidArgument(_)), "got {err:?}");
    assert_eq!(migrator.version().unwrap(), 0);
}

// ── Bad fixture ────────────────────────────────────────────────────────

#[test]
fn test_bad_fixture_stops_at_broken_up() {
    let db = memory_db();
    let migrator = open("bad", &db);

    let err = migrator.up(0).unwrap_err();
    match &err {
        MigrateError::ScriptExecutionError {
            version,
            name,
            direction,
            ..
        } => {
            assert_eq!(*version, 2);
            assert_eq!(name, "broken");
            assert_eq!(*direction, Direction::Up);
        }
        other => panic!("expected ScriptExecutionError, got {other:?}"),
    }

    assert_eq!(migrator.version().unwrap(), 1);
    assert_eq!(list_versions(&migrator), vec![1]);
    assert_eq!(plan_versions(&migrator), vec![2, 3]);
    assert!(table_exists(&db, "accounts"));
    assert!(!table_exists(&db, "broken"));
    assert!(!table_exists(&db, "audit_log"));
}

#[test]
fn test_bad_fixture_stops_at_broken_down() {
    let db = memory_db();
    let migrator = open("bad", &db);
    assert!(migrator.up(0).is_err());

    // Pretend 2 and 3 were applied by some other means.
    migrator.ledger().record_applied(&*db, 2, "broken").unwrap();
    migrator
        .ledger()
        .record_applied(&*db, 3, "create_audit_log")
        .unwrap();
    assert_eq!(migrator.version().unwrap(), 3);

    let err = migrator.down(0).unwrap_err();
    assert_eq!(err.failed_version(), Some(2));

    assert_eq!(migrator.version().unwrap(), 2);
    assert_eq!(list_versions(&migrator), vec![1, 2]);
    assert!(table_exists(&db, "accounts"));
}

// ── Load failures ──────────────────────────────────────────────────────

#[test]
fn test_missing_directory_is_load_error() {
    let db = memory_db();
    let options = MigratorOptions::new("tests/fixtures/does_not_exist")
        .with_runner(Arc::new(db.step_runner().unwrap()))
        .with_context(db.clone());
    let err = Migrator::new(options).err().unwrap();
    assert!(matches!(err, MigrateError::LoadError(_)), "got {err:?}");
}

// ── Persistence ────────────────────────────────────────────────────────

#[test]
fn test_ledger_persists_across_connections() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.duckdb");

    {
        let db = Arc::new(DuckDbBackend::from_path(&path).unwrap());
        let migrator = open("good", &db);
        migrator.up(2).unwrap();
    }

    let db = Arc::new(DuckDbBackend::from_path(&path).unwrap());
    let migrator = open("good", &db);
    assert_eq!(migrator.version().unwrap(), 2);
    assert_eq!(plan_versions(&migrator), vec![3]);
    assert_eq!(migrator.up(0).unwrap().versions, vec![3]);
}

#[test]
fn test_custom_ledger_table() {
    let db = memory_db();
    let options = MigratorOptions::new("tests/fixtures/good")
        .with_runner(Arc::new(db.step_runner().unwrap()))
        .with_context(db.clone())
        .with_table_name("meta.applied_migrations");
    let migrator = Migrator::new(options).unwrap();
    migrator.up(0).unwrap();

    let count = db
        .query_one("SELECT COUNT(*) FROM meta.applied_migrations", &[])
        .unwrap()
        .get_i64(0)
        .unwrap();
    assert_eq!(count, 3);
    assert!(!table_exists(&db, "schema_migrations"));
}
