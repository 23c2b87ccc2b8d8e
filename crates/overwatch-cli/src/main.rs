//! Overwatch CLI
//!
//! The command-line interface for detecting drift between live access
//! control and the desired state kept in git.

mod cli;
mod commands;
mod error;
mod logging;

use std::process::ExitCode;

use clap::Parser;
use colored::Colorize;

use cli::{Cli, Commands};
use error::Result;

/// Exit status reported when drift is found.
const DRIFT_EXIT_CODE: u8 = 2;

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    logging::init(cli.verbose)?;
    tracing::debug!("Verbose mode enabled");

    match cli.command {
        Some(cmd) => execute_command(cmd),
        None => {
            // No command provided - show help hint
            println!("{} drift detection for access control", "overwatch".green().bold());
            println!();
            println!("Run {} for available commands.", "overwatch --help".cyan());
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn execute_command(cmd: Commands) -> Result<ExitCode> {
    match cmd {
        Commands::Sync { config } => {
            commands::run_sync(&config)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Resources { target, json } => {
            commands::run_resources(&target, json)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Drift { target, live, json } => {
            let drifted = commands::run_drift(&target, &live, json)?;
            Ok(if drifted {
                ExitCode::from(DRIFT_EXIT_CODE)
            } else {
                ExitCode::SUCCESS
            })
        }
        Commands::Watch {
            target,
            live,
            poll,
            iterations,
        } => {
            commands::run_watch(&target, &live, poll, iterations)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
