//! Project Configuration (simrun.toml)
//!
//! Every section and field is optional; accessors fall back to defaults.
//!
//! ```toml
//! [registry]
//! path = "simulation/targets.json"
//!
//! [tools.compiler]
//! program = "iverilog"
//! args = ["-g2012"]
//!
//! [simulation]
//! trace_file = "dump.vcd"
//! visualize = false
//! ```

use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_REGISTRY_PATH: &str = "simulation/targets.json";
pub const DEFAULT_COMPILER: &str = "iverilog";
pub const DEFAULT_SIMULATOR: &str = "vvp";
pub const DEFAULT_VIEWER: &str = "gtkwave";
pub const DEFAULT_TRACE_FILE: &str = "dump.vcd";
pub const DEFAULT_ARTIFACT_EXTENSION: &str = "vvp";

/// Project configuration from simrun.toml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Target registry location
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registry: Option<RegistryConfig>,

    /// External tools
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<ToolsConfig>,

    /// Simulation outputs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub simulation: Option<SimulationConfig>,
}

/// Registry configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct RegistryConfig {
    /// Registry file, relative to the project root
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// External tool table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ToolsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compiler: Option<ToolConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub simulator: Option<ToolConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewer: Option<ToolConfig>,
}

/// A single external tool
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ToolConfig {
    /// Program name or path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub program: Option<String>,

    /// Arguments placed before the ones simrun adds
    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
}

/// Simulation configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct SimulationConfig {
    /// Trace file written by the simulation (default: "dump.vcd")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_file: Option<String>,

    /// Compiled artifact extension (default: "vvp")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact_extension: Option<String>,

    /// Open the waveform viewer after simulating (default: true)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visualize: Option<bool>,
}

impl ProjectConfig {
    /// Load project configuration from a file
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::IoError(e)
            }
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::TomlParseError {
            file: path.to_path_buf(),
            error: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the project configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(tools) = &self.tools {
            for (name, tool) in [
                ("compiler", &tools.compiler),
                ("simulator", &tools.simulator),
                ("viewer", &tools.viewer),
            ] {
                if let Some(program) = tool.as_ref().and_then(|t| t.program.as_ref()) {
                    if program.trim().is_empty() {
                        return Err(ConfigError::InvalidValue {
                            field: format!("tools.{}.program", name),
                            reason: "program cannot be empty".to_string(),
                        });
                    }
                }
            }
        }

        if let Some(sim) = &self.simulation {
            if let Some(trace) = &sim.trace_file {
                if trace.trim().is_empty() {
                    return Err(ConfigError::InvalidValue {
                        field: "simulation.trace_file".to_string(),
                        reason: "trace file name cannot be empty".to_string(),
                    });
                }
            }
            if let Some(ext) = &sim.artifact_extension {
                if ext.trim().is_empty() || ext.starts_with('.') {
                    return Err(ConfigError::InvalidValue {
                        field: "simulation.artifact_extension".to_string(),
                        reason: "extension must be non-empty and not start with '.'".to_string(),
                    });
                }
            }
        }

        Ok(())
    }

    /// Registry path, relative to the project root
    pub fn registry_path(&self) -> PathBuf {
        self.registry
            .as_ref()
            .and_then(|r| r.path.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_REGISTRY_PATH))
    }

    /// Compiler program and leading args
    pub fn compiler(&self) -> (String, Vec<String>) {
        resolve_tool(
            self.tools.as_ref().and_then(|t| t.compiler.as_ref()),
            DEFAULT_COMPILER,
        )
    }

    /// Simulator program and leading args
    pub fn simulator(&self) -> (String, Vec<String>) {
        resolve_tool(
            self.tools.as_ref().and_then(|t| t.simulator.as_ref()),
            DEFAULT_SIMULATOR,
        )
    }

    /// Waveform viewer program and leading args
    pub fn viewer(&self) -> (String, Vec<String>) {
        resolve_tool(
            self.tools.as_ref().and_then(|t| t.viewer.as_ref()),
            DEFAULT_VIEWER,
        )
    }

    /// Get the trace file name
    pub fn trace_file(&self) -> &str {
        self.simulation
            .as_ref()
            .and_then(|s| s.trace_file.as_deref())
            .unwrap_or(DEFAULT_TRACE_FILE)
    }

    /// Get the compiled artifact extension
    pub fn artifact_extension(&self) -> &str {
        self.simulation
            .as_ref()
            .and_then(|s| s.artifact_extension.as_deref())
            .unwrap_or(DEFAULT_ARTIFACT_EXTENSION)
    }

    /// Whether to open the waveform viewer
    pub fn visualize(&self) -> bool {
        self.simulation
            .as_ref()
            .and_then(|s| s.visualize)
            .unwrap_or(true)
    }

    pub(crate) fn tools_mut(&mut self) -> &mut ToolsConfig {
        self.tools.get_or_insert_with(Default::default)
    }

    pub(crate) fn simulation_mut(&mut self) -> &mut SimulationConfig {
        self.simulation.get_or_insert_with(Default::default)
    }
}

fn resolve_tool(tool: Option<&ToolConfig>, default_program: &str) -> (String, Vec<String>) {
    match tool {
        Some(tool) => (
            tool.program
                .clone()
                .unwrap_or_else(|| default_program.to_string()),
            tool.args.clone(),
        ),
        None => (default_program.to_string(), Vec::new()),
    }
}
