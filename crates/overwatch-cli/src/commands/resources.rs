//! Resources command implementation

use colored::Colorize;
use overwatch_core::{Manager, Resource, StaticProducer};

use super::{load_config, target_kinds};
use crate::cli::Target;
use crate::error::Result;

/// Print the desired state for `target`.
pub fn run_resources(target: &Target, json: bool) -> Result<()> {
    let config = load_config(&target.config)?;

    // The producer is never drained here; it only declares the kinds to load.
    let producer = StaticProducer::new(&target.provider, Vec::new()).with_kinds(target_kinds(target));
    let mut manager = Manager::new(producer);
    manager.load_configuration(&config)?;
    let resources = manager.resources();

    if json {
        println!("{}", serde_json::to_string_pretty(&resources)?);
    } else {
        print_resources(&target.provider, config.project(), &resources);
    }
    Ok(())
}

fn print_resources(provider: &str, project: &str, resources: &[Resource]) {
    println!("{} {}/{}", "Desired state".bold(), provider, project);
    println!();

    if resources.is_empty() {
        println!("  {}", "No resources".dimmed());
        return;
    }

    for resource in resources {
        let applied: Vec<String> = resource
            .applied_config()
            .iter()
            .map(ToString::to_string)
            .collect();
        if applied.is_empty() {
            println!("  {}", resource.to_string().cyan());
        } else {
            println!("  {} {}", resource.to_string().cyan(), applied.join(", ").dimmed());
        }
    }
    println!();
    println!("{} resources", resources.len());
}
