//! Version command implementation

use anyhow::Result;

use crate::cli::GlobalArgs;
use crate::commands::common::open_migrator;

/// Execute the version command
pub fn execute(global: &GlobalArgs) -> Result<()> {
    let migrator = open_migrator(global)?;
    println!("{}", migrator.version()?);
    Ok(())
}
