//! Configuration Loader
//!
//! Finds `simrun.toml` and applies environment overrides on top of it.

use crate::project::{ProjectConfig, RegistryConfig, ToolConfig};
use crate::{ConfigResult, CONFIG_FILE_NAME};
use std::env;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Configuration loader
///
/// Merges configuration with the following precedence:
/// 1. Project config (simrun.toml) - lowest priority
/// 2. Environment variables (SIMRUN_*) - overrides project
/// 3. CLI flags - highest priority (handled by caller)
#[derive(Debug, Default)]
pub struct ConfigLoader {
    /// Skip environment overrides
    ignore_env: bool,
}

/// Merged configuration result
#[derive(Debug, Clone)]
pub struct Config {
    /// Project configuration
    pub project: ProjectConfig,

    /// Directory relative paths are resolved against
    pub root: PathBuf,

    /// The simrun.toml that was loaded, if any
    pub config_file: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self { ignore_env: false }
    }

    /// Do not read SIMRUN_* variables
    pub fn without_env(mut self) -> Self {
        self.ignore_env = true;
        self
    }

    /// Load configuration starting from the given directory
    ///
    /// Walks up the directory tree to find simrun.toml. Without one, the
    /// start directory becomes the root and defaults apply.
    pub fn load_from_directory(&self, start_dir: &Path) -> ConfigResult<Config> {
        let mut current = start_dir.to_path_buf();

        loop {
            let config_path = current.join(CONFIG_FILE_NAME);
            if config_path.is_file() {
                return self.load_from_file(&config_path);
            }

            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => break,
            }
        }

        debug!(start = %start_dir.display(), "no simrun.toml found, using defaults");
        Ok(Config {
            project: self.apply_env_overrides(ProjectConfig::default()),
            root: start_dir.to_path_buf(),
            config_file: None,
        })
    }

    /// Load configuration from a specific config file
    pub fn load_from_file(&self, config_path: &Path) -> ConfigResult<Config> {
        let project = ProjectConfig::load_from_file(config_path)?;
        let project = self.apply_env_overrides(project);
        project.validate()?;

        let root = config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        debug!(file = %config_path.display(), "loaded project config");
        Ok(Config {
            project,
            root,
            config_file: Some(config_path.to_path_buf()),
        })
    }

    /// Apply environment variable overrides to project config
    fn apply_env_overrides(&self, mut config: ProjectConfig) -> ProjectConfig {
        if self.ignore_env {
            return config;
        }

        if let Some(path) = non_empty_var("SIMRUN_REGISTRY") {
            config.registry = Some(RegistryConfig {
                path: Some(PathBuf::from(path)),
            });
        }

        if let Some(program) = non_empty_var("SIMRUN_COMPILER") {
            set_program(&mut config.tools_mut().compiler, program);
        }
        if let Some(program) = non_empty_var("SIMRUN_SIMULATOR") {
            set_program(&mut config.tools_mut().simulator, program);
        }
        if let Some(program) = non_empty_var("SIMRUN_VIEWER") {
            set_program(&mut config.tools_mut().viewer, program);
        }

        if let Some(trace) = non_empty_var("SIMRUN_TRACE_FILE") {
            config.simulation_mut().trace_file = Some(trace);
        }

        if let Ok(no_view) = env::var("SIMRUN_NO_VIEW") {
            if is_truthy(&no_view) {
                config.simulation_mut().visualize = Some(false);
            }
        }

        config
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn set_program(slot: &mut Option<ToolConfig>, program: String) {
    slot.get_or_insert_with(Default::default).program = Some(program);
}

fn is_truthy(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

impl Config {
    /// Registry file, resolved against the root
    pub fn registry_path(&self) -> PathBuf {
        self.root.join(self.project.registry_path())
    }

    /// Check if a simrun.toml was found
    pub fn is_project(&self) -> bool {
        self.config_file.is_some()
    }
}
