//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Tidemark - versioned SQL schema migrations
#[derive(Parser, Debug)]
#[command(name = "tm")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to project directory
    #[arg(short = 'p', long, global = true, default_value = ".")]
    pub project_dir: String,

    /// Override database path (`:memory:` for a throwaway database)
    #[arg(short, long, global = true, env = "TIDEMARK_DATABASE")]
    pub database: Option<String>,

    /// Override migrations directory
    #[arg(short, long, global = true)]
    pub migrations: Option<String>,

    /// Override ledger table name
    #[arg(long, global = true)]
    pub table: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Apply pending migrations
    Up(UpArgs),

    /// Roll back applied migrations
    Down(DownArgs),

    /// Show migrations that `up` would apply
    Plan(PlanArgs),

    /// List applied migrations recorded in the ledger
    List(ListArgs),

    /// Print the current schema version
    Version,

    /// Create a new up/down migration pair
    New(NewArgs),
}

/// Arguments for the up command
#[derive(Args, Debug)]
pub struct UpArgs {
    /// Number of migrations to apply (0 = all pending)
    #[arg(short = 'n', long, default_value_t = 0, allow_negative_numbers = true)]
    pub steps: i64,
}

/// Arguments for the down command
#[derive(Args, Debug)]
pub struct DownArgs {
    /// Number of migrations to roll back (0 = all applied)
    #[arg(short = 'n', long, default_value_t = 0, allow_negative_numbers = true)]
    pub steps: i64,
}

/// Arguments for the plan command
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub output: OutputFormat,
}

/// Arguments for the list command
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub output: OutputFormat,
}

/// Arguments for the new command
#[derive(Args, Debug)]
pub struct NewArgs {
    /// Migration name (letters, digits and underscores)
    pub name: String,

    /// Use a UTC timestamp (YYYYMMDDHHMMSS) as the version
    #[arg(long)]
    pub timestamp: bool,
}

/// Output formats for plan and list
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Table format
    Table,
    /// JSON output
    Json,
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
