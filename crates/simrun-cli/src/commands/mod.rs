pub mod list;
pub mod run;

use anyhow::{Context, Result};
use simrun_build::TargetRegistry;
use simrun_config::{Config, ConfigLoader};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Load simrun.toml from an explicit path or by searching upward
pub(crate) fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let loader = ConfigLoader::new();
    match config_path {
        Some(path) => loader
            .load_from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => {
            let cwd = std::env::current_dir().context("Failed to read current directory")?;
            loader
                .load_from_directory(&cwd)
                .context("Failed to load simrun.toml")
        }
    }
}

/// Load the registry named on the command line, or the configured one
pub(crate) fn load_registry(
    registry_flag: Option<PathBuf>,
    config: &Config,
) -> Result<TargetRegistry> {
    let path = registry_flag.unwrap_or_else(|| config.registry_path());
    debug!(registry = %path.display(), root = %config.root.display(), "loading registry");
    TargetRegistry::load(&path)
        .with_context(|| format!("Failed to load target registry {}", path.display()))
}
