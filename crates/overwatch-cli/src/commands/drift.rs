//! Drift command implementation
//!
//! Compares a live snapshot against the desired state without changing
//! either.

use std::path::Path;

use colored::Colorize;
use serde_json::json;

use overwatch_core::{Classification, Manager, Resource, SnapshotProducer};
use overwatch_fs::NormalizedPath;

use super::{load_config, target_kinds};
use crate::cli::Target;
use crate::error::Result;

/// Run the drift command.
///
/// Returns `true` when drift was found.
pub fn run_drift(target: &Target, live: &Path, json: bool) -> Result<bool> {
    let config = load_config(&target.config)?;
    let producer = SnapshotProducer::new(&target.provider, NormalizedPath::new(live))
        .with_kinds(target_kinds(target));

    let mut manager = Manager::new(producer);
    manager.load_configuration(&config)?;
    let classification = manager.classify()?;
    let drifted = !classification.is_clean();

    if json {
        let output = json!({
            "provider": target.provider,
            "project": config.project(),
            "drift": drifted,
            "new": classification.new,
            "modified": classification.modified,
            "unchanged": classification.unchanged.len(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_drift(&target.provider, config.project(), &classification);
    }

    Ok(drifted)
}

/// Print human-readable drift output
pub(crate) fn print_drift(provider: &str, project: &str, classification: &Classification) {
    if classification.is_clean() {
        println!(
            "{} No drift. {}/{} matches its desired state ({} resources).",
            "OK".green().bold(),
            provider,
            project,
            classification.unchanged.len()
        );
        return;
    }

    println!("{} {}/{}", "Drift detected".yellow().bold(), provider, project);
    println!();
    for resource in &classification.new {
        print_resource("+".green().to_string(), resource, "new");
    }
    for resource in &classification.modified {
        print_resource("~".yellow().to_string(), resource, "modified");
    }
    println!();
    println!(
        "{} new, {} modified, {} unchanged",
        classification.new.len(),
        classification.modified.len(),
        classification.unchanged.len()
    );
}

fn print_resource(marker: String, resource: &Resource, label: &str) {
    println!("  {} {} ({})", marker, resource.to_string().cyan(), label);
    for applied in resource.applied_config() {
        println!("      {}", applied.to_string().dimmed());
    }
}
