//! Sync command implementation

use std::path::Path;

use colored::Colorize;
use overwatch_git::{GitSynchro, Store};

use super::load_config;
use crate::error::Result;

/// Run the synchro configured in `config_path` once.
pub fn run_sync(config_path: &Path) -> Result<()> {
    let config = load_config(config_path)?;
    config.validate()?;

    let mut synchro = GitSynchro::new(config.synchro_info())?;
    let changed = synchro.sync()?;

    if changed {
        println!("{} Working copy updated", "OK".green().bold());
    } else {
        println!("{} Already up to date", "OK".green().bold());
    }
    println!("{}: {}", "Remote".dimmed(), synchro.remote_url());
    println!("{}: {}", "Branch".dimmed(), synchro.branch());
    println!("{}: {}", "Path".dimmed(), synchro.path());
    Ok(())
}
