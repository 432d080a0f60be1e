//! Tidemark CLI - versioned SQL schema migrations

use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;

use cli::Cli;
use commands::{down, list, new_migration, plan, up, version};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.global.verbose);

    match &cli.command {
        cli::Commands::Up(args) => up::execute(args, &cli.global),
        cli::Commands::Down(args) => down::execute(args, &cli.global),
        cli::Commands::Plan(args) => plan::execute(args, &cli.global),
        cli::Commands::List(args) => list::execute(args, &cli.global),
        cli::Commands::Version => version::execute(&cli.global),
        cli::Commands::New(args) => new_migration::execute(args, &cli.global),
    }
}

/// `RUST_LOG` wins; otherwise info, or debug with `--verbose`.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .format_target(false)
        .init();
}
