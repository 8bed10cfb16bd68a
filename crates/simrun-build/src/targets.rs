/// Build target definitions as they appear in the target registry
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Outputs directory used when a target does not declare one
pub const DEFAULT_OUTPUTS_DIR: &str = "outputs";

fn default_outputs_dir() -> String {
    DEFAULT_OUTPUTS_DIR.to_string()
}

/// A named unit of buildable and simulatable work
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Target {
    /// Unique target identifier
    pub id: String,
    /// Human-readable summary shown by `--list`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Source files specific to this target, in compile order
    #[serde(default)]
    pub sources: Vec<String>,
    /// Targets whose sources are pulled in ahead of this target's own
    #[serde(default)]
    pub include_targets: Vec<String>,
    /// Directory the external tools run in (root target only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<String>,
    /// Destination for generated artifacts, relative to the working directory
    #[serde(default = "default_outputs_dir")]
    pub outputs_dir: String,
    /// Trace file name the simulation is expected to write
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_file: Option<String>,
}

impl Target {
    /// Create a new target with no sources or includes
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: None,
            sources: Vec::new(),
            include_targets: Vec::new(),
            working_dir: None,
            outputs_dir: default_outputs_dir(),
            trace_file: None,
        }
    }

    /// Set source files
    pub fn with_sources<I, S>(mut self, sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sources = sources.into_iter().map(Into::into).collect();
        self
    }

    /// Set included targets
    pub fn with_includes<I, S>(mut self, includes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include_targets = includes.into_iter().map(Into::into).collect();
        self
    }

    /// Set the working directory
    pub fn with_working_dir(mut self, working_dir: impl Into<String>) -> Self {
        self.working_dir = Some(working_dir.into());
        self
    }

    /// Set the outputs directory
    pub fn with_outputs_dir(mut self, outputs_dir: impl Into<String>) -> Self {
        self.outputs_dir = outputs_dir.into();
        self
    }

    /// Set the expected trace file name
    pub fn with_trace_file(mut self, trace_file: impl Into<String>) -> Self {
        self.trace_file = Some(trace_file.into());
        self
    }

    /// Path of the compiled artifact, relative to the working directory
    pub fn artifact_path(&self, extension: &str) -> PathBuf {
        PathBuf::from(&self.outputs_dir).join(format!("{}.{}", self.id, extension))
    }

    /// Path of the simulation trace, relative to the working directory
    pub fn trace_path(&self, default_trace_file: &str) -> PathBuf {
        let name = self.trace_file.as_deref().unwrap_or(default_trace_file);
        PathBuf::from(&self.outputs_dir).join(name)
    }

    /// Validate the target definition
    pub fn validate(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("Target id cannot be empty".to_string());
        }
        // The id names the artifact file inside outputs_dir
        if self.id.contains(['/', '\\']) || self.id == "." || self.id == ".." {
            return Err(format!(
                "Target id '{}' must not contain path separators or be '.' or '..'",
                self.id
            ));
        }
        if self.outputs_dir.trim().is_empty() {
            return Err(format!("Target '{}' has an empty outputs_dir", self.id));
        }
        Ok(())
    }
}
