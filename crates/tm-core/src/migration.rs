//! The migration data model.

use serde::Serialize;
use std::fmt;

/// One versioned unit of schema change.
///
/// Instances are created by a [`MigrationSource`](crate::MigrationSource) and
/// never mutated afterwards. Versions are unique and strictly positive within
/// a loaded set; `0` is reserved to mean "nothing applied".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Migration {
    /// Unique, ascending version number
    pub version: i64,

    /// Descriptive name taken from the file name
    pub name: String,

    /// Script applied when moving forward
    #[serde(skip_serializing)]
    pub up: String,

    /// Script applied when moving backward (may be empty)
    #[serde(skip_serializing)]
    pub down: String,
}

impl Migration {
    /// Create a migration from its parts.
    pub fn new(
        version: i64,
        name: impl Into<String>,
        up: impl Into<String>,
        down: impl Into<String>,
    ) -> Self {
        Self {
            version,
            name: name.into(),
            up: up.into(),
            down: down.into(),
        }
    }

    /// The `<version>_<name>` stem shared by the up and down files.
    pub fn file_stem(&self) -> String {
        format!("{}_{}", self.version, self.name)
    }

    /// Whether rolling back runs any script at all.
    pub fn has_down(&self) -> bool {
        !self.down.trim().is_empty()
    }
}

impl fmt::Display for Migration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{:03} {}", self.version, self.name)
    }
}
