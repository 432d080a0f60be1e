//! CLI command implementations

pub(crate) mod common;
pub(crate) mod down;
pub(crate) mod list;
pub(crate) mod new_migration;
pub(crate) mod plan;
pub(crate) mod up;
pub(crate) mod version;
