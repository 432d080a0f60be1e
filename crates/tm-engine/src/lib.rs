//! Migration engine for Tidemark.
//!
//! Applies an ordered set of versioned migrations to a database and keeps a
//! ledger of applied versions in a table inside the same database. Each step
//! (one script plus its ledger row) commits on its own through a
//! [`StepRunner`](tm_db::StepRunner), so a failure mid-batch leaves every
//! earlier step in place and the ledger accurate.

pub mod error;
pub mod executor;
pub mod ledger;
pub mod migrator;
pub mod planner;

pub use error::{MigrateError, MigrateResult};
pub use executor::{Direction, Executor};
pub use ledger::{Ledger, LedgerRecord};
pub use migrator::{Migrator, MigratorOptions, StepReport};
pub use tm_core::DEFAULT_TABLE_NAME;
