//! Configuration types and parsing for tidemark.yml

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default name of the ledger table.
pub const DEFAULT_TABLE_NAME: &str = "schema_migrations";

const DEFAULT_DB_PATH: &str = ":memory:";

const DEFAULT_MIGRATIONS_PATH: &str = "migrations";

/// File names probed by [`Config::load_from_dir`], in order.
pub const CONFIG_FILE_NAMES: &[&str] = &["tidemark.yml", "tidemark.yaml"];

/// Project configuration from tidemark.yml
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Database connection configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Directory holding the migration files
    #[serde(default = "default_migrations_path")]
    pub migrations_path: String,

    /// Ledger table, optionally schema-qualified
    #[serde(default = "default_table_name")]
    pub table_name: String,
}

/// Database connection configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Database path (DuckDB file or `:memory:`)
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            migrations_path: default_migrations_path(),
            table_name: default_table_name(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> String {
    DEFAULT_DB_PATH.to_string()
}

fn default_migrations_path() -> String {
    DEFAULT_MIGRATIONS_PATH.to_string()
}

fn default_table_name() -> String {
    DEFAULT_TABLE_NAME.to_string()
}

impl Config {
    /// Load configuration from a file path
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        let config: Config =
            serde_yaml::from_str(&content).map_err(|e| CoreError::ConfigParseError {
                message: format!("{}: {e}", path.display()),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a project directory
    pub fn load_from_dir(dir: &Path) -> CoreResult<Self> {
        match Self::find_in_dir(dir) {
            Some(path) => Self::load(&path),
            None => Err(CoreError::ConfigNotFound {
                path: dir.join(CONFIG_FILE_NAMES[0]).display().to_string(),
            }),
        }
    }

    /// Load configuration from a project directory, falling back to defaults
    /// when no config file exists.
    pub fn load_from_dir_or_default(dir: &Path) -> CoreResult<Self> {
        match Self::find_in_dir(dir) {
            Some(path) => Self::load(&path),
            None => {
                log::debug!("No config file in {}, using defaults", dir.display());
                Ok(Self::default())
            }
        }
    }

    fn find_in_dir(dir: &Path) -> Option<PathBuf> {
        CONFIG_FILE_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.exists())
    }

    /// Validate the configuration
    pub fn validate(&self) -> CoreResult<()> {
        if self.migrations_path.is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "migrations_path cannot be empty".to_string(),
            });
        }
        if self.database.path.is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "database.path cannot be empty".to_string(),
            });
        }
        validate_table_name(&self.table_name)
            .map_err(|message| CoreError::ConfigInvalid { message })
    }

    /// Migrations directory resolved against the project root
    pub fn migrations_path_absolute(&self, root: &Path) -> PathBuf {
        root.join(&self.migrations_path)
    }

    /// Database path resolved against the project root (`:memory:` untouched)
    pub fn database_path_absolute(&self, root: &Path) -> String {
        if self.database.path == DEFAULT_DB_PATH || Path::new(&self.database.path).is_absolute()
        {
            self.database.path.clone()
        } else {
            root.join(&self.database.path).display().to_string()
        }
    }
}

/// Check that `name` is `ident` or `schema.ident`.
///
/// The ledger table name is interpolated into SQL, so only plain identifiers
/// (`[A-Za-z_][A-Za-z0-9_]*`) are accepted.
pub fn validate_table_name(name: &str) -> Result<(), String> {
    let parts: Vec<&str> = name.split('.').collect();
    if parts.len() > 2 {
        return Err(format!(
            "table name '{name}' has too many parts (expected 'table' or 'schema.table')"
        ));
    }
    for part in parts {
        if !is_identifier(part) {
            return Err(format!(
                "table name '{name}' is not a valid identifier (use letters, digits and '_')"
            ));
        }
    }
    Ok(())
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
