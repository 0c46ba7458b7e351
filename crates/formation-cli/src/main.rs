//! Formation CLI
//!
//! The command-line interface for applying resource templates.

mod cli;
mod commands;
mod error;
mod logging;

use clap::Parser;
use colored::Colorize;

use cli::{Cli, Commands};
use commands::ApplyOptions;
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    if let Err(err) = logging::init(cli.verbose) {
        tracing::debug!("keeping existing subscriber: {}", err);
    }
    tracing::debug!("Verbose mode enabled");

    match cli.command {
        Some(cmd) => execute_command(cmd),
        None => {
            println!("{} Formation CLI", "formation".green().bold());
            println!();
            println!("Run {} for available commands.", "formation --help".cyan());
            Ok(())
        }
    }
}

fn execute_command(cmd: Commands) -> Result<()> {
    let cwd = std::env::current_dir()?;
    match cmd {
        Commands::Apply {
            template,
            state,
            policy,
            parent,
            output,
            json,
            tree,
        } => commands::run_apply(
            &cwd,
            &ApplyOptions {
                template,
                state,
                policy,
                parent,
                output,
                json,
                tree,
            },
        ),
        Commands::Validate {
            template,
            parent,
            json,
        } => commands::run_validate(&template, parent.as_deref(), json),
        Commands::Inspect { state, json } => commands::run_inspect(&state, json),
    }
}
