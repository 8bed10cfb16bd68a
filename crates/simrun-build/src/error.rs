/// Build system error types
use std::path::PathBuf;
use thiserror::Error;

pub type BuildResult<T> = Result<T, BuildError>;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Malformed target registry {source_name}: {reason}")]
    MalformedRegistry { source_name: String, reason: String },

    #[error("Target '{target}' not found{}", required_by_suffix(.required_by))]
    UndefinedTarget {
        target: String,
        required_by: Option<String>,
    },

    #[error("No working directory specified for target '{target}'")]
    MissingWorkingDirectory { target: String },

    #[error("Working directory {} for target '{target}' does not exist", .path.display())]
    WorkingDirectoryNotFound { target: String, path: PathBuf },

    #[error("{stage} failed: '{program}' exited with {}", exit_status_text(.exit_code))]
    ToolFailed {
        stage: String,
        program: String,
        exit_code: Option<i32>,
    },

    #[error("{stage} failed: could not start '{program}': {error}")]
    ToolSpawn {
        stage: String,
        program: String,
        error: std::io::Error,
    },

    #[error("I/O error at {path}: {error}")]
    IoError {
        path: PathBuf,
        error: std::io::Error,
    },
}

fn required_by_suffix(required_by: &Option<String>) -> String {
    match required_by {
        Some(parent) => format!(" (included by '{}')", parent),
        None => String::new(),
    }
}

fn exit_status_text(exit_code: &Option<i32>) -> String {
    match exit_code {
        Some(code) => format!("status {}", code),
        None => "no status (terminated by signal)".to_string(),
    }
}

impl BuildError {
    /// Create a malformed registry error
    pub fn malformed(source_name: impl Into<String>, reason: impl ToString) -> Self {
        Self::MalformedRegistry {
            source_name: source_name.into(),
            reason: reason.to_string(),
        }
    }

    /// Create an undefined target error
    pub fn undefined_target(target: impl Into<String>, required_by: Option<&str>) -> Self {
        Self::UndefinedTarget {
            target: target.into(),
            required_by: required_by.map(str::to_string),
        }
    }

    /// Create an I/O error with path context
    pub fn io(path: impl Into<PathBuf>, error: std::io::Error) -> Self {
        Self::IoError {
            path: path.into(),
            error,
        }
    }

    /// The offending target identifier for undefined-target errors
    pub fn undefined_target_id(&self) -> Option<&str> {
        match self {
            Self::UndefinedTarget { target, .. } => Some(target),
            _ => None,
        }
    }
}

/// Non-fatal problems reported by the pipeline
///
/// Warnings never abort a run; they are collected into the
/// [`PipelineReport`](crate::pipeline::PipelineReport) and printed.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum BuildWarning {
    /// Trace file was not produced by the simulator
    TraceFileMissing { path: PathBuf },
    /// Waveform viewer could not be started
    ViewerUnavailable { program: String, reason: String },
    /// Waveform viewer exited unsuccessfully
    ViewerFailed {
        program: String,
        exit_code: Option<i32>,
    },
}

impl std::fmt::Display for BuildWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TraceFileMissing { path } => {
                write!(f, "Waveform file {} not found", path.display())
            }
            Self::ViewerUnavailable { program, reason } => {
                write!(f, "Could not start waveform viewer '{}': {}", program, reason)
            }
            Self::ViewerFailed { program, exit_code } => write!(
                f,
                "Waveform viewer '{}' exited with {}",
                program,
                exit_status_text(exit_code)
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_undefined_target_message_root() {
        let err = BuildError::undefined_target("t9", None);
        assert_eq!(err.to_string(), "Target 't9' not found");
        assert_eq!(err.undefined_target_id(), Some("t9"));
    }

    #[test]
    fn test_undefined_target_message_nested() {
        let err = BuildError::undefined_target("lib", Some("top"));
        assert_eq!(err.to_string(), "Target 'lib' not found (included by 'top')");
    }

    #[test]
    fn test_tool_failed_message() {
        let err = BuildError::ToolFailed {
            stage: "compile".to_string(),
            program: "iverilog".to_string(),
            exit_code: Some(2),
        };
        assert_eq!(err.to_string(), "compile failed: 'iverilog' exited with status 2");
    }

    #[test]
    fn test_working_dir_not_found_message() {
        let err = BuildError::WorkingDirectoryNotFound {
            target: "t1".to_string(),
            path: PathBuf::from("proj/typo_dir"),
        };
        assert_eq!(
            err.to_string(),
            "Working directory proj/typo_dir for target 't1' does not exist"
        );
    }

    #[test]
    fn test_warning_display() {
        let warning = BuildWarning::TraceFileMissing {
            path: PathBuf::from("outputs/dump.vcd"),
        };
        assert_eq!(warning.to_string(), "Waveform file outputs/dump.vcd not found");
    }
}
