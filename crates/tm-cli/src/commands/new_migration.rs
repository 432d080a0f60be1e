//! New command implementation

use anyhow::{bail, Context, Result};
use chrono::Utc;
use tm_core::scaffold::{next_version, scaffold_migration, timestamp_version};
use tm_core::{DirectorySource, MigrationSource};

use crate::cli::{GlobalArgs, NewArgs};
use crate::commands::common::load_project;

/// Execute the new command
pub fn execute(args: &NewArgs, global: &GlobalArgs) -> Result<()> {
    let project = load_project(global)?;
    let dir = project.migrations_dir();

    let existing = if dir.exists() {
        DirectorySource
            .load(&dir)
            .context("Failed to load existing migrations")?
    } else {
        Vec::new()
    };

    let version = if args.timestamp {
        timestamp_version(Utc::now())
    } else {
        next_version(&existing)
    };
    if let Some(clash) = existing.iter().find(|m| m.version == version) {
        bail!("Version {version} is already used by {}", clash.file_stem());
    }

    let created = scaffold_migration(&dir, version, &args.name)
        .with_context(|| format!("Failed to create migration '{}'", args.name))?;
    println!("Created {}", created.up_path.display());
    println!("Created {}", created.down_path.display());
    Ok(())
}
