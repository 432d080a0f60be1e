//! Error types for tm-core

use thiserror::Error;

/// Core error type for Tidemark
#[derive(Error, Debug)]
pub enum CoreError {
    /// E001: Configuration file not found
    #[error("[E001] Config file not found: {path}")]
    ConfigNotFound { path: String },

    /// E002: Failed to parse configuration file
    #[error("[E002] Failed to parse config: {message}")]
    ConfigParseError { message: String },

    /// E003: Invalid configuration value
    #[error("[E003] Invalid config: {message}")]
    ConfigInvalid { message: String },

    /// E004: Migrations directory not found
    #[error("[E004] Migrations directory not found: {path}")]
    MigrationDirNotFound { path: String },

    /// E005: Migration file name could not be parsed
    #[error("[E005] Invalid migration file '{path}': {reason}")]
    InvalidMigrationFile { path: String, reason: String },

    /// E006: Two files claim the same version
    #[error("[E006] Duplicate migration version {version} in {path1} and {path2}")]
    DuplicateVersion {
        version: i64,
        path1: String,
        path2: String,
    },

    /// E007: A down script exists without its up script
    #[error("[E007] Migration version {version} has a down script but no up script: {path}")]
    MissingUpScript { version: i64, path: String },

    /// E008: Invalid migration name for scaffolding
    #[error("[E008] Invalid migration name '{name}': {reason}")]
    InvalidMigrationName { name: String, reason: String },

    /// E009: Scaffolding would overwrite an existing file
    #[error("[E009] Migration file already exists: {path}")]
    MigrationExists { path: String },

    /// E010: IO error with file path context
    #[error("[E010] I/O error on '{path}': {source}")]
    IoWithPath {
        path: String,
        source: std::io::Error,
    },
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;
