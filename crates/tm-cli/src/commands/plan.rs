//! Plan command implementation

use anyhow::{Context, Result};
use serde::Serialize;
use tm_core::Migration;

use crate::cli::{GlobalArgs, OutputFormat, PlanArgs};
use crate::commands::common::{open_migrator, print_table};

/// Pending migration for display
#[derive(Debug, Serialize)]
struct PlanEntry<'a> {
    version: i64,
    name: &'a str,
    reversible: bool,
}

impl<'a> From<&'a Migration> for PlanEntry<'a> {
    fn from(m: &'a Migration) -> Self {
        Self {
            version: m.version,
            name: &m.name,
            reversible: m.has_down(),
        }
    }
}

/// Execute the plan command
pub fn execute(args: &PlanArgs, global: &GlobalArgs) -> Result<()> {
    let migrator = open_migrator(global)?;
    let pending = migrator.plan()?;
    let entries: Vec<PlanEntry> = pending.iter().map(PlanEntry::from).collect();

    match args.output {
        OutputFormat::Json => {
            let json =
                serde_json::to_string_pretty(&entries).context("Failed to serialize plan")?;
            println!("{json}");
        }
        OutputFormat::Table => {
            if entries.is_empty() {
                println!("No pending migrations");
                return Ok(());
            }
            let rows: Vec<Vec<String>> = entries
                .iter()
                .map(|e| {
                    vec![
                        e.version.to_string(),
                        e.name.to_string(),
                        if e.reversible { "yes" } else { "no" }.to_string(),
                    ]
                })
                .collect();
            print_table(&["VERSION", "NAME", "REVERSIBLE"], &rows);
            println!();
            println!("{} pending migration(s)", entries.len());
        }
    }
    Ok(())
}
