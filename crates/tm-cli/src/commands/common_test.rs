use super::*;

fn global(project_dir: &str) -> GlobalArgs {
    GlobalArgs {
        verbose: false,
        project_dir: project_dir.to_string(),
        database: None,
        migrations: None,
        table: None,
    }
}

#[test]
fn test_calculate_column_widths() {
    let rows = vec![
        vec!["1".to_string(), "create_users".to_string()],
        vec!["20240309140507".to_string(), "x".to_string()],
    ];
    assert_eq!(
        calculate_column_widths(&["VERSION", "NAME"], &rows),
        vec![14, 12]
    );
}

#[test]
fn test_overrides_replace_config_values() {
    let mut config = Config::default();
    let mut args = global(".");
    args.database = Some("app.duckdb".to_string());
    args.migrations = Some("db/migrations".to_string());
    args.table = Some("meta.ledger".to_string());

    apply_overrides(&mut config, &args);
    assert_eq!(config.database.path, "app.duckdb");
    assert_eq!(config.migrations_path, "db/migrations");
    assert_eq!(config.table_name, "meta.ledger");
}

#[test]
fn test_load_project_without_config_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let project = load_project(&global(dir.path().to_str().unwrap())).unwrap();
    assert_eq!(project.config.table_name, tm_core::DEFAULT_TABLE_NAME);
    assert_eq!(project.migrations_dir(), dir.path().join("migrations"));
    assert_eq!(project.database_path(), ":memory:");
}

#[test]
fn test_load_project_rejects_bad_table_override() {
    let dir = tempfile::tempdir().unwrap();
    let mut args = global(dir.path().to_str().unwrap());
    args.table = Some("a.b.c".to_string());
    assert!(load_project(&args).is_err());
}

#[test]
fn test_open_migrator_on_file_database() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("migrations")).unwrap();
    std::fs::write(
        dir.path().join("migrations/1_init.up.sql"),
        "CREATE TABLE t (id BIGINT);",
    )
    .unwrap();
    let mut args = global(dir.path().to_str().unwrap());
    args.database = Some("app.duckdb".to_string());

    let migrator = open_migrator(&args).unwrap();
    assert_eq!(migrator.migrations().len(), 1);
    finish_steps(&migrator, migrator.up(0)).unwrap();
    assert_eq!(migrator.version().unwrap(), 1);
    assert!(dir.path().join("app.duckdb").exists());
}
