//! List command - show targets defined in the registry

use super::{load_config, load_registry};
use anyhow::Result;
use colored::*;
use simrun_build::TargetRegistry;
use std::path::PathBuf;

/// List command arguments
pub struct ListArgs {
    pub registry: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub json: bool,
}

pub fn run(args: ListArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let registry = load_registry(args.registry, &config)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&targets_json(&registry))?);
        return Ok(());
    }

    if registry.is_empty() {
        println!("No targets defined");
        return Ok(());
    }

    let width = registry.iter().map(|t| t.id.len()).max().unwrap_or(0);
    for target in registry.iter() {
        let is_default = target.id == registry.default_target_id();
        let marker = if is_default { "*".green().bold() } else { " ".normal() };
        let description = target.description.as_deref().unwrap_or("");
        println!(
            "{} {:<width$}  {}",
            marker,
            target.id,
            description.dimmed(),
            width = width
        );
    }

    if !registry.contains(registry.default_target_id()) {
        eprintln!(
            "{} default target '{}' is not defined",
            "warning:".yellow().bold(),
            registry.default_target_id()
        );
    }

    Ok(())
}

fn targets_json(registry: &TargetRegistry) -> serde_json::Value {
    let targets: Vec<serde_json::Value> = registry
        .iter()
        .map(|target| {
            serde_json::json!({
                "id": target.id,
                "description": target.description,
                "default": target.id == registry.default_target_id(),
                "sources": target.sources.len(),
                "include_targets": target.include_targets,
                "working_dir": target.working_dir,
            })
        })
        .collect();

    serde_json::json!({
        "default_target": registry.default_target_id(),
        "targets": targets,
    })
}
