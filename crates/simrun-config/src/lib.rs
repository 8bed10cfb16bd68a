//! simrun configuration
//!
//! Provides the optional project configuration file (`simrun.toml`) and
//! environment overrides for the toolchain.
//!
//! # Configuration Hierarchy
//!
//! Values are merged in the following order (later overrides earlier):
//! 1. Built-in defaults (Icarus Verilog + GTKWave)
//! 2. Project config (`simrun.toml`, found by walking up from the start directory)
//! 3. Environment variables (`SIMRUN_*`)
//! 4. CLI flags (applied by the caller)
//!
//! # Example
//!
//! ```no_run
//! use simrun_config::ConfigLoader;
//! use std::path::Path;
//!
//! let config = ConfigLoader::new().load_from_directory(Path::new(".")).unwrap();
//! println!("registry: {}", config.registry_path().display());
//! ```

pub mod loader;
pub mod project;

use std::path::PathBuf;
use thiserror::Error;

/// Name of the project configuration file
pub const CONFIG_FILE_NAME: &str = "simrun.toml";

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid TOML syntax in {file}: {error}")]
    TomlParseError {
        file: PathBuf,
        error: toml::de::Error,
    },

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

// Re-export main types
pub use loader::{Config, ConfigLoader};
pub use project::{ProjectConfig, RegistryConfig, SimulationConfig, ToolConfig, ToolsConfig};
