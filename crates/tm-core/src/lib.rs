//! tm-core - Core library for Tidemark
//!
//! This crate provides the migration data model, the directory-backed
//! migration source, migration scaffolding, and project configuration
//! parsing shared by the engine and the CLI.

pub mod config;
pub mod error;
pub mod migration;
pub mod scaffold;
pub mod source;

pub use config::{Config, DEFAULT_TABLE_NAME};
pub use error::{CoreError, CoreResult};
pub use migration::Migration;
pub use source::{DirectorySource, MigrationSource};
