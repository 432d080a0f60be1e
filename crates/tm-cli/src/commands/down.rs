//! Down command implementation

use anyhow::Result;

use crate::cli::{DownArgs, GlobalArgs};
use crate::commands::common::{finish_steps, open_migrator};

/// Execute the down command
pub fn execute(args: &DownArgs, global: &GlobalArgs) -> Result<()> {
    let migrator = open_migrator(global)?;
    if args.steps == 0 {
        log::info!("Rolling back every applied migration");
    }
    finish_steps(&migrator, migrator.down(args.steps))
}
