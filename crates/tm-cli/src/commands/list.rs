//! List command implementation

use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::HashSet;

use crate::cli::{GlobalArgs, ListArgs, OutputFormat};
use crate::commands::common::{open_migrator, print_table};

/// Ledger row for display
#[derive(Debug, Serialize)]
struct ListEntry {
    version: i64,
    name: String,
    /// Whether a migration file with this version was loaded
    known: bool,
}

/// Execute the list command
pub fn execute(args: &ListArgs, global: &GlobalArgs) -> Result<()> {
    let migrator = open_migrator(global)?;
    let records = migrator.list()?;
    let unknown: HashSet<i64> = migrator.unknown_versions()?.into_iter().collect();

    let entries: Vec<ListEntry> = records
        .into_iter()
        .map(|r| ListEntry {
            known: !unknown.contains(&r.version),
            version: r.version,
            name: r.name,
        })
        .collect();

    match args.output {
        OutputFormat::Json => {
            let json =
                serde_json::to_string_pretty(&entries).context("Failed to serialize ledger")?;
            println!("{json}");
        }
        OutputFormat::Table => print_entries(&entries, unknown.len()),
    }
    Ok(())
}

fn print_entries(entries: &[ListEntry], unknown_count: usize) {
    if entries.is_empty() {
        println!("No migrations applied");
        return;
    }
    let rows: Vec<Vec<String>> = entries
        .iter()
        .map(|e| {
            vec![
                e.version.to_string(),
                e.name.clone(),
                if e.known { "applied" } else { "applied (no file)" }.to_string(),
            ]
        })
        .collect();
    print_table(&["VERSION", "NAME", "STATUS"], &rows);
    println!();
    println!("{} applied migration(s)", entries.len());
    if unknown_count > 0 {
        println!("{unknown_count} applied version(s) have no migration file");
    }
}
