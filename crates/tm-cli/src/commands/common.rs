//! Shared helpers for CLI commands

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tm_core::Config;
use tm_db::DuckDbBackend;
use tm_engine::{MigrateResult, Migrator, MigratorOptions, StepReport};

use crate::cli::GlobalArgs;

/// Project configuration with CLI overrides applied.
#[derive(Debug)]
pub(crate) struct Project {
    pub root: PathBuf,
    pub config: Config,
}

impl Project {
    pub(crate) fn migrations_dir(&self) -> PathBuf {
        self.config.migrations_path_absolute(&self.root)
    }

    pub(crate) fn database_path(&self) -> String {
        self.config.database_path_absolute(&self.root)
    }
}

/// Load the project from the directory specified in global CLI arguments.
///
/// A missing `tidemark.yml` is not an error; defaults apply.
pub(crate) fn load_project(global: &GlobalArgs) -> Result<Project> {
    let root = PathBuf::from(&global.project_dir);
    let mut config =
        Config::load_from_dir_or_default(&root).context("Failed to load configuration")?;
    apply_overrides(&mut config, global);
    config.validate().context("Invalid configuration")?;
    Ok(Project { root, config })
}

/// Copy `--database`, `--migrations` and `--table` into `config`.
pub(crate) fn apply_overrides(config: &mut Config, global: &GlobalArgs) {
    if let Some(database) = &global.database {
        config.database.path = database.clone();
    }
    if let Some(migrations) = &global.migrations {
        config.migrations_path = migrations.clone();
    }
    if let Some(table) = &global.table {
        config.table_name = table.clone();
    }
}

/// Open the project database and build a migrator over it.
pub(crate) fn open_migrator(global: &GlobalArgs) -> Result<Migrator> {
    let project = load_project(global)?;
    let db_path = project.database_path();
    if db_path == ":memory:" {
        log::warn!("Using an in-memory database; nothing will persist after this command");
    }

    let backend = Arc::new(
        DuckDbBackend::new(&db_path)
            .with_context(|| format!("Failed to open database: {db_path}"))?,
    );
    let runner = backend
        .step_runner()
        .context("Failed to open step connection")?;
    log::debug!("Opened database {db_path}");

    let options = MigratorOptions::new(project.migrations_dir())
        .with_runner(Arc::new(runner))
        .with_context(backend)
        .with_table_name(project.config.table_name.clone());
    Migrator::new(options).context("Failed to initialize migrator")
}

/// Print the outcome of `up`/`down` and the resulting version.
///
/// On failure the version reached before the failing step is printed to
/// stderr before the error is returned.
pub(crate) fn finish_steps(migrator: &Migrator, result: MigrateResult<StepReport>) -> Result<()> {
    let report = match result {
        Ok(report) => report,
        Err(e) => {
            if let Ok(version) = migrator.version() {
                eprintln!("Stopped at version {version}");
            }
            return Err(e.into());
        }
    };

    if report.is_empty() {
        println!("Nothing to migrate {}", report.direction);
    } else {
        for version in &report.versions {
            println!("  {} {}", report.direction, describe(migrator, *version));
        }
        println!();
        println!(
            "Migrated {} {} step{}",
            report.direction,
            report.versions.len(),
            if report.versions.len() == 1 { "" } else { "s" }
        );
    }
    println!("Current version: {}", migrator.version()?);
    Ok(())
}

fn describe(migrator: &Migrator, version: i64) -> String {
    migrator
        .migrations()
        .iter()
        .find(|m| m.version == version)
        .map(ToString::to_string)
        .unwrap_or_else(|| format!("v{version:03}"))
}

/// Compute column widths for a table given headers and rows.
pub(crate) fn calculate_column_widths(headers: &[&str], rows: &[Vec<String>]) -> Vec<usize> {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (w, cell) in widths.iter_mut().zip(row.iter()) {
            *w = (*w).max(cell.len());
        }
    }
    widths
}

/// Print a formatted table to stdout.
///
/// Prints a left-aligned header row, a separator line of dashes, and each
/// data row. Columns are separated by two spaces.
pub(crate) fn print_table(headers: &[&str], rows: &[Vec<String>]) {
    let widths = calculate_column_widths(headers, rows);

    let header_parts: Vec<String> = headers
        .iter()
        .zip(&widths)
        .map(|(h, &w)| format!("{:<width$}", h, width = w))
        .collect();
    println!("{}", header_parts.join("  ").trim_end());

    let sep_parts: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    println!("{}", sep_parts.join("  "));

    for row in rows {
        let row_parts: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(cell, &w)| format!("{:<width$}", cell, width = w))
            .collect();
        println!("{}", row_parts.join("  ").trim_end());
    }
}

#[cfg(test)]
#[path = "common_test.rs"]
mod tests;
