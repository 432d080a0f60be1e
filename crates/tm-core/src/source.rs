//! Migration discovery from storage.
//!
//! A [`MigrationSource`] turns a location into an ordered list of
//! [`Migration`]s. The stock implementation, [`DirectorySource`], reads pairs
//! of `<version>_<name>.up.sql` / `<version>_<name>.down.sql` files from a
//! single directory. Script bodies are read verbatim; syntax errors only
//! surface when a script is executed.

use crate::error::{CoreError, CoreResult};
use crate::migration::Migration;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Suffix of forward scripts.
pub const UP_SUFFIX: &str = ".up.sql";

/// Suffix of backward scripts.
pub const DOWN_SUFFIX: &str = ".down.sql";

/// Loads an ordered set of migrations from a location.
pub trait MigrationSource {
    /// Load every migration at `path`, sorted ascending by version.
    fn load(&self, path: &Path) -> CoreResult<Vec<Migration>>;
}

/// Reads migrations from the files of one directory (non-recursive).
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectorySource;

/// Which half of a migration a file holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScriptKind {
    Up,
    Down,
}

/// A migration file name split into its parts.
#[derive(Debug, PartialEq, Eq)]
struct ParsedFileName<'a> {
    version: i64,
    raw_version: &'a str,
    name: &'a str,
    kind: ScriptKind,
}

/// Half-assembled migration while scanning the directory.
#[derive(Default)]
struct PendingMigration {
    raw_version: String,
    name: String,
    first_path: PathBuf,
    up: Option<(PathBuf, String)>,
    down: Option<(PathBuf, String)>,
}

impl MigrationSource for DirectorySource {
    fn load(&self, path: &Path) -> CoreResult<Vec<Migration>> {
        if !path.is_dir() {
            return Err(CoreError::MigrationDirNotFound {
                path: path.display().to_string(),
            });
        }

        let mut pending: BTreeMap<i64, PendingMigration> = BTreeMap::new();
        for file in sorted_sql_files(path)? {
            let file_name = file
                .file_name()
                .and_then(|n| n.to_str())
                .ok_or_else(|| CoreError::InvalidMigrationFile {
                    path: file.display().to_string(),
                    reason: "file name is not valid UTF-8".to_string(),
                })?;
            let parsed = parse_file_name(file_name).map_err(|reason| {
                CoreError::InvalidMigrationFile {
                    path: file.display().to_string(),
                    reason,
                }
            })?;
            let body = std::fs::read_to_string(&file).map_err(|e| CoreError::IoWithPath {
                path: file.display().to_string(),
                source: e,
            })?;
            insert_script(&mut pending, parsed, file.clone(), body)?;
        }

        let mut migrations = Vec::with_capacity(pending.len());
        for (version, item) in pending {
            let Some((_, up)) = item.up else {
                let down_path = item.down.map(|(p, _)| p).unwrap_or(item.first_path);
                return Err(CoreError::MissingUpScript {
                    version,
                    path: down_path.display().to_string(),
                });
            };
            let down = item.down.map(|(_, body)| body).unwrap_or_default();
            migrations.push(Migration::new(version, item.name, up, down));
        }

        log::debug!(
            "Loaded {} migrations from {}",
            migrations.len(),
            path.display()
        );
        Ok(migrations)
    }
}

/// List the `.sql` files of `dir` in file-name order.
fn sorted_sql_files(dir: &Path) -> CoreResult<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir).map_err(|e| CoreError::IoWithPath {
        path: dir.display().to_string(),
        source: e,
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| CoreError::IoWithPath {
            path: dir.display().to_string(),
            source: e,
        })?;
        let path = entry.path();
        if path.is_dir() {
            continue;
        }
        if !path.extension().is_some_and(|e| e == "sql") {
            log::debug!("Skipping non-SQL file {}", path.display());
            continue;
        }
        files.push(path);
    }
    files.sort();
    Ok(files)
}

/// Split `<version>_<name>.up.sql` / `<version>_<name>.down.sql`.
fn parse_file_name(file_name: &str) -> Result<ParsedFileName<'_>, String> {
    let (stem, kind) = if let Some(stem) = file_name.strip_suffix(UP_SUFFIX) {
        (stem, ScriptKind::Up)
    } else if let Some(stem) = file_name.strip_suffix(DOWN_SUFFIX) {
        (stem, ScriptKind::Down)
    } else {
        return Err(format!(
            "expected '<version>_<name>{UP_SUFFIX}' or '<version>_<name>{DOWN_SUFFIX}'"
        ));
    };

    let Some((raw_version, name)) = stem.split_once('_') else {
        return Err("missing '_' between version and name".to_string());
    };
    if name.is_empty() {
        return Err("migration name is empty".to_string());
    }

    let version: i64 = raw_version
        .parse()
        .map_err(|_| format!("cannot parse version '{raw_version}'"))?;
    if version <= 0 {
        return Err(format!("version must be positive, got {version}"));
    }

    Ok(ParsedFileName {
        version,
        raw_version,
        name,
        kind,
    })
}

fn insert_script(
    pending: &mut BTreeMap<i64, PendingMigration>,
    parsed: ParsedFileName<'_>,
    path: PathBuf,
    body: String,
) -> CoreResult<()> {
    let entry = pending
        .entry(parsed.version)
        .or_insert_with(|| PendingMigration {
            raw_version: parsed.raw_version.to_string(),
            name: parsed.name.to_string(),
            first_path: path.clone(),
            ..Default::default()
        });

    // `01_x` and `1_x` never pair up.
    if entry.name != parsed.name || entry.raw_version != parsed.raw_version {
        return Err(CoreError::DuplicateVersion {
            version: parsed.version,
            path1: entry.first_path.display().to_string(),
            path2: path.display().to_string(),
        });
    }

    let slot = match parsed.kind {
        ScriptKind::Up => &mut entry.up,
        ScriptKind::Down => &mut entry.down,
    };
    if let Some((existing, _)) = slot {
        return Err(CoreError::DuplicateVersion {
            version: parsed.version,
            path1: existing.display().to_string(),
            path2: path.display().to_string(),
        });
    }
    *slot = Some((path, body));
    Ok(())
}

#[cfg(test)]
#[path = "source_test.rs"]
mod tests;
