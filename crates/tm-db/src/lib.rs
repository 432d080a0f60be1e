//! tm-db - Data-access layer for Tidemark
//!
//! This crate provides the capability traits the migration engine consumes
//! ([`QueryContext`] for statements and reads, [`StepRunner`] for
//! independently committed units of work) and their DuckDB implementation.

pub mod duckdb;
pub mod error;
pub mod traits;
pub mod value;

pub use crate::duckdb::{DuckDbBackend, DuckDbStepRunner};
pub use error::{DbError, DbResult};
pub use traits::{QueryContext, StepRunner};
pub use value::{Row, Value};
