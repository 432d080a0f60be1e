//! Up command implementation

use anyhow::Result;

use crate::cli::{GlobalArgs, UpArgs};
use crate::commands::common::{finish_steps, open_migrator};

/// Execute the up command
pub fn execute(args: &UpArgs, global: &GlobalArgs) -> Result<()> {
    let migrator = open_migrator(global)?;
    finish_steps(&migrator, migrator.up(args.steps))
}
