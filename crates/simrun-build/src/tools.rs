//! External tool invocation
//!
//! The compiler, simulator and waveform viewer are opaque external programs.
//! Each call blocks until the process exits; there is no timeout.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};
use tracing::debug;

/// A configured external program plus fixed leading arguments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCommand {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl ToolCommand {
    /// Create a tool command with no extra arguments
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Set leading arguments
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Build an invocation with `extra` appended after the configured args
    pub fn invocation<I, S>(&self, cwd: &Path, extra: I) -> ToolInvocation
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut args = self.args.clone();
        args.extend(extra.into_iter().map(Into::into));
        ToolInvocation {
            program: self.program.clone(),
            args,
            cwd: cwd.to_path_buf(),
        }
    }
}

/// Toolchain used by the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolchainConfig {
    pub compiler: ToolCommand,
    pub simulator: ToolCommand,
    pub viewer: ToolCommand,
    /// Extension of the compiled artifact
    pub artifact_extension: String,
    /// Trace file name for targets that do not declare one
    pub trace_file: String,
    /// Run the viewer after a successful simulation
    pub visualize: bool,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            compiler: ToolCommand::new("iverilog"),
            simulator: ToolCommand::new("vvp"),
            viewer: ToolCommand::new("gtkwave"),
            artifact_extension: "vvp".to_string(),
            trace_file: "dump.vcd".to_string(),
            visualize: true,
        }
    }
}

/// A fully-specified process launch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    pub program: String,
    pub args: Vec<String>,
    /// Directory the process runs in
    pub cwd: PathBuf,
}

impl ToolInvocation {
    /// Shell-like rendering for progress output
    pub fn command_line(&self) -> String {
        let mut line = self.program.clone();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

/// Exit information of a finished tool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolExit {
    /// Exit code, `None` if terminated by a signal
    pub code: Option<i32>,
    pub duration: Duration,
}

impl ToolExit {
    /// Check if the tool succeeded
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Runs external tools
///
/// `Err` means the process could not be started at all.
pub trait ToolRunner {
    fn run(&self, invocation: &ToolInvocation) -> std::io::Result<ToolExit>;
}

impl<T: ToolRunner + ?Sized> ToolRunner for &T {
    fn run(&self, invocation: &ToolInvocation) -> std::io::Result<ToolExit> {
        (**self).run(invocation)
    }
}

/// Where a child tool's stdout goes
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ToolStdout {
    /// Share simrun's stdout
    #[default]
    Inherit,
    /// Forward to simrun's stderr, keeping stdout for machine-readable output
    Stderr,
}

/// Runs tools as child processes
///
/// stdin is closed and stderr is inherited; stdout follows [`ToolStdout`].
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner {
    stdout: ToolStdout,
}

impl ProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set where child stdout goes
    pub fn with_stdout(mut self, stdout: ToolStdout) -> Self {
        self.stdout = stdout;
        self
    }

    pub fn stdout(&self) -> ToolStdout {
        self.stdout
    }
}

impl ToolRunner for ProcessRunner {
    fn run(&self, invocation: &ToolInvocation) -> std::io::Result<ToolExit> {
        debug!(
            program = %invocation.program,
            cwd = %invocation.cwd.display(),
            args = ?invocation.args,
            "spawning tool"
        );

        let stdout = match self.stdout {
            ToolStdout::Inherit => Stdio::inherit(),
            ToolStdout::Stderr => Stdio::from(std::io::stderr()),
        };

        let start = Instant::now();
        let status = Command::new(&invocation.program)
            .args(&invocation.args)
            .current_dir(&invocation.cwd)
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(Stdio::inherit())
            .status()?;

        let exit = ToolExit {
            code: status.code(),
            duration: start.elapsed(),
        };
        debug!(program = %invocation.program, code = ?exit.code, "tool exited");
        Ok(exit)
    }
}
