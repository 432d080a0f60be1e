//! Scaffolding for new migration files.

use crate::error::{CoreError, CoreResult};
use crate::migration::Migration;
use crate::source::{DOWN_SUFFIX, UP_SUFFIX};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

/// Paths of a freshly scaffolded migration pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScaffoldedMigration {
    pub version: i64,
    pub up_path: PathBuf,
    pub down_path: PathBuf,
}

/// The version following the highest loaded one (1 for an empty set).
pub fn next_version(migrations: &[Migration]) -> i64 {
    migrations.iter().map(|m| m.version).max().unwrap_or(0) + 1
}

/// A `YYYYMMDDHHMMSS` version derived from a timestamp.
pub fn timestamp_version(now: DateTime<Utc>) -> i64 {
    let formatted = now.format("%Y%m%d%H%M%S").to_string();
    // Fourteen ASCII digits always fit in an i64.
    formatted.parse().unwrap_or(0)
}

/// Write an empty up/down pair for `name` at `version` into `dir`.
///
/// Creates `dir` if needed and never overwrites an existing file.
pub fn scaffold_migration(dir: &Path, version: i64, name: &str) -> CoreResult<ScaffoldedMigration> {
    validate_name(name)?;
    if version <= 0 {
        return Err(CoreError::InvalidMigrationName {
            name: name.to_string(),
            reason: format!("version must be positive, got {version}"),
        });
    }

    std::fs::create_dir_all(dir).map_err(|e| CoreError::IoWithPath {
        path: dir.display().to_string(),
        source: e,
    })?;

    let up_path = dir.join(format!("{version}_{name}{UP_SUFFIX}"));
    let down_path = dir.join(format!("{version}_{name}{DOWN_SUFFIX}"));
    for path in [&up_path, &down_path] {
        if path.exists() {
            return Err(CoreError::MigrationExists {
                path: path.display().to_string(),
            });
        }
    }

    write_file(&up_path, &format!("-- {version}_{name}: apply\n"))?;
    write_file(&down_path, &format!("-- {version}_{name}: revert\n"))?;

    Ok(ScaffoldedMigration {
        version,
        up_path,
        down_path,
    })
}

fn validate_name(name: &str) -> CoreResult<()> {
    if name.is_empty() {
        return Err(CoreError::InvalidMigrationName {
            name: name.to_string(),
            reason: "name is empty".to_string(),
        });
    }
    if let Some(bad) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '_'))
    {
        return Err(CoreError::InvalidMigrationName {
            name: name.to_string(),
            reason: format!("character '{bad}' is not allowed (use letters, digits and '_')"),
        });
    }
    Ok(())
}

fn write_file(path: &Path, content: &str) -> CoreResult<()> {
    std::fs::write(path, content).map_err(|e| CoreError::IoWithPath {
        path: path.display().to_string(),
        source: e,
    })
}

#[cfg(test)]
#[path = "scaffold_test.rs"]
mod tests;
