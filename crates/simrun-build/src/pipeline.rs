//! Build orchestration: resolve, compile, simulate, visualize
//!
//! The driver is a small state machine:
//!
//! ```text
//! Start -> Resolve -> Compile -> Simulate -> Visualize -> Done
//!             |          |          |
//!             +----------+----------+------> Failed
//! ```
//!
//! Visualize never fails the run; its problems become [`BuildWarning`]s.

use crate::error::{BuildError, BuildResult, BuildWarning};
use crate::output::BuildProgress;
use crate::registry::TargetRegistry;
use crate::resolver::{resolve, Resolution};
use crate::tools::{ProcessRunner, ToolInvocation, ToolRunner, ToolStdout, ToolchainConfig};
use serde::{Serialize, Serializer};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// A tool-driven pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Compile,
    Simulate,
    Visualize,
}

impl Stage {
    /// Get stage name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Compile => "compile",
            Self::Simulate => "simulate",
            Self::Visualize => "visualize",
        }
    }

    /// Whether a failure in this stage aborts the run
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Visualize)
    }

    /// Get all stages in execution order
    pub fn all() -> [Stage; 3] {
        [Self::Compile, Self::Simulate, Self::Visualize]
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Pipeline driver state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineState {
    Start,
    Resolve,
    Compile,
    Simulate,
    Visualize,
    Done,
    Failed,
}

impl PipelineState {
    /// Next state after the current one finishes
    ///
    /// `ok` is false when the work of the current state failed fatally.
    /// Visualize always moves on to `Done`.
    pub fn advance(self, ok: bool) -> Self {
        match (self, ok) {
            (Self::Start, _) => Self::Resolve,
            (Self::Resolve, true) => Self::Compile,
            (Self::Compile, true) => Self::Simulate,
            (Self::Simulate, true) => Self::Visualize,
            (Self::Resolve | Self::Compile | Self::Simulate, false) => Self::Failed,
            (Self::Visualize, _) => Self::Done,
            (Self::Done, _) => Self::Done,
            (Self::Failed, _) => Self::Failed,
        }
    }

    /// Tool stage run in this state, if any
    pub fn stage(self) -> Option<Stage> {
        match self {
            Self::Compile => Some(Stage::Compile),
            Self::Simulate => Some(Stage::Simulate),
            Self::Visualize => Some(Stage::Visualize),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

/// Classified result of one stage
#[derive(Debug)]
pub enum StageOutcome {
    Success,
    /// Stage was disabled
    Skipped,
    /// Problem that does not affect the overall result
    Recoverable(BuildWarning),
    /// Problem that aborts the run
    Fatal(BuildError),
}

impl StageOutcome {
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal(_))
    }
}

/// How a stage ended, as recorded in the report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StageStatus {
    Succeeded,
    Skipped,
    Warned,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageRecord {
    pub stage: Stage,
    pub status: StageStatus,
    #[serde(rename = "seconds", serialize_with = "duration_secs")]
    pub elapsed: Duration,
}

/// Everything the tools need for one target, derived from a resolution
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuildPlan {
    pub resolution: Resolution,
    /// Working directory the tools run in
    pub working_dir: PathBuf,
    /// Outputs directory, relative to the working directory
    pub outputs_dir: PathBuf,
    /// Compiled artifact, relative to the working directory
    pub artifact: PathBuf,
    /// Expected trace file, relative to the working directory
    pub trace: PathBuf,
}

impl BuildPlan {
    pub fn target(&self) -> &str {
        &self.resolution.root
    }

    pub fn sources(&self) -> &[String] {
        &self.resolution.sources
    }
}

/// Summary of a successful run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineReport {
    pub plan: BuildPlan,
    pub stages: Vec<StageRecord>,
    pub warnings: Vec<BuildWarning>,
    pub final_state: PipelineState,
    #[serde(rename = "total_seconds", serialize_with = "duration_secs")]
    pub total_time: Duration,
}

impl PipelineReport {
    /// Status recorded for a stage, if it ran
    pub fn status_of(&self, stage: Stage) -> Option<StageStatus> {
        self.stages
            .iter()
            .find(|record| record.stage == stage)
            .map(|record| record.status)
    }
}

fn duration_secs<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64())
}

/// Drives the external toolchain for one target
pub struct Pipeline<'r, R = ProcessRunner> {
    registry: &'r TargetRegistry,
    toolchain: ToolchainConfig,
    /// Directory that working directories are relative to
    base_dir: PathBuf,
    runner: R,
    progress: BuildProgress,
}

impl<'r> Pipeline<'r, ProcessRunner> {
    /// Create a pipeline with the default toolchain and process runner
    pub fn new(registry: &'r TargetRegistry) -> Self {
        Self {
            registry,
            toolchain: ToolchainConfig::default(),
            base_dir: PathBuf::from("."),
            runner: ProcessRunner::new(),
            progress: BuildProgress::default(),
        }
    }

    /// Route tool stdout, e.g. away from a JSON report on stdout
    pub fn with_tool_stdout(mut self, stdout: ToolStdout) -> Self {
        self.runner = self.runner.with_stdout(stdout);
        self
    }
}

impl<'r, R: ToolRunner> Pipeline<'r, R> {
    /// Replace the tool runner
    pub fn with_runner<R2: ToolRunner>(self, runner: R2) -> Pipeline<'r, R2> {
        Pipeline {
            registry: self.registry,
            toolchain: self.toolchain,
            base_dir: self.base_dir,
            runner,
            progress: self.progress,
        }
    }

    /// Set the toolchain
    pub fn with_toolchain(mut self, toolchain: ToolchainConfig) -> Self {
        self.toolchain = toolchain;
        self
    }

    /// Set the directory that working directories are resolved against
    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = base_dir.into();
        self
    }

    /// Set the progress reporter
    pub fn with_progress(mut self, progress: BuildProgress) -> Self {
        self.progress = progress;
        self
    }

    /// Resolve a target and derive tool paths without touching the filesystem
    pub fn plan(&self, target_id: &str) -> BuildResult<BuildPlan> {
        let resolution = resolve(target_id, self.registry)?;
        let working_dir = self.base_dir.join(resolution.require_working_dir()?);

        let target = self
            .registry
            .get(target_id)
            .ok_or_else(|| BuildError::undefined_target(target_id, None))?;

        Ok(BuildPlan {
            working_dir,
            outputs_dir: PathBuf::from(&target.outputs_dir),
            artifact: target.artifact_path(&self.toolchain.artifact_extension),
            trace: target.trace_path(&self.toolchain.trace_file),
            resolution,
        })
    }

    /// Run the full pipeline for a target
    pub fn run(&self, target_id: &str) -> BuildResult<PipelineReport> {
        let started = Instant::now();
        let mut state = PipelineState::Start.advance(true);

        let plan = match self.plan(target_id).and_then(|plan| {
            check_working_dir(&plan)?;
            Ok(plan)
        }) {
            Ok(plan) => plan,
            Err(err) => {
                debug!(target_id, from = ?state, to = ?state.advance(false), "resolve failed");
                return Err(err);
            }
        };
        if plan.resolution.has_cycles() {
            warn!(target_id, "include cycle absorbed during resolution");
        }
        state = state.advance(true);

        let mut stages = Vec::new();
        let mut warnings = Vec::new();

        while let Some(stage) = state.stage() {
            let stage_started = Instant::now();
            let outcome = self.run_stage(stage, &plan);
            let elapsed = stage_started.elapsed();
            let next = state.advance(!outcome.is_fatal());
            debug!(%stage, from = ?state, to = ?next, "stage finished");

            let status = match outcome {
                StageOutcome::Success => {
                    self.progress.stage_finished(stage, elapsed);
                    StageStatus::Succeeded
                }
                StageOutcome::Skipped => {
                    self.progress.stage_skipped(stage);
                    StageStatus::Skipped
                }
                StageOutcome::Recoverable(warning) => {
                    self.progress.warning(&warning);
                    warnings.push(warning);
                    StageStatus::Warned
                }
                StageOutcome::Fatal(err) => return Err(err),
            };
            stages.push(StageRecord {
                stage,
                status,
                elapsed,
            });
            state = next;
        }

        let total_time = started.elapsed();
        self.progress
            .finished(plan.target(), total_time, warnings.len());

        Ok(PipelineReport {
            plan,
            stages,
            warnings,
            final_state: state,
            total_time,
        })
    }

    fn run_stage(&self, stage: Stage, plan: &BuildPlan) -> StageOutcome {
        let cwd = plan.working_dir.as_path();
        match stage {
            Stage::Compile => {
                let outputs = cwd.join(&plan.outputs_dir);
                if let Err(err) = fs::create_dir_all(&outputs) {
                    return StageOutcome::Fatal(BuildError::io(outputs, err));
                }
                let mut args = vec!["-o".to_string(), path_arg(&plan.artifact)];
                args.extend(plan.sources().iter().cloned());
                let invocation = self.toolchain.compiler.invocation(cwd, args);
                self.run_tool(stage, &invocation)
            }
            Stage::Simulate => {
                let invocation = self
                    .toolchain
                    .simulator
                    .invocation(cwd, [path_arg(&plan.artifact)]);
                self.run_tool(stage, &invocation)
            }
            Stage::Visualize => {
                if !self.toolchain.visualize {
                    return StageOutcome::Skipped;
                }
                if !cwd.join(&plan.trace).exists() {
                    return StageOutcome::Recoverable(BuildWarning::TraceFileMissing {
                        path: plan.trace.clone(),
                    });
                }
                let invocation = self
                    .toolchain
                    .viewer
                    .invocation(cwd, ["-f".to_string(), path_arg(&plan.trace)]);
                self.run_tool(stage, &invocation)
            }
        }
    }

    fn run_tool(&self, stage: Stage, invocation: &ToolInvocation) -> StageOutcome {
        self.progress.stage_started(stage, invocation);

        match self.runner.run(invocation) {
            Ok(exit) if exit.success() => StageOutcome::Success,
            Ok(exit) if stage.is_fatal() => StageOutcome::Fatal(BuildError::ToolFailed {
                stage: stage.name().to_string(),
                program: invocation.program.clone(),
                exit_code: exit.code,
            }),
            Ok(exit) => StageOutcome::Recoverable(BuildWarning::ViewerFailed {
                program: invocation.program.clone(),
                exit_code: exit.code,
            }),
            Err(error) if stage.is_fatal() => StageOutcome::Fatal(BuildError::ToolSpawn {
                stage: stage.name().to_string(),
                program: invocation.program.clone(),
                error,
            }),
            Err(error) => StageOutcome::Recoverable(BuildWarning::ViewerUnavailable {
                program: invocation.program.clone(),
                reason: error.to_string(),
            }),
        }
    }
}

/// The working directory must already exist; only the outputs dir is created
fn check_working_dir(plan: &BuildPlan) -> BuildResult<()> {
    if plan.working_dir.is_dir() {
        Ok(())
    } else {
        Err(BuildError::WorkingDirectoryNotFound {
            target: plan.target().to_string(),
            path: plan.working_dir.clone(),
        })
    }
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_transitions() {
        let mut state = PipelineState::Start;
        let mut seen = vec![state];
        while !state.is_terminal() {
            state = state.advance(true);
            seen.push(state);
        }
        assert_eq!(
            seen,
            vec![
                PipelineState::Start,
                PipelineState::Resolve,
                PipelineState::Compile,
                PipelineState::Simulate,
                PipelineState::Visualize,
                PipelineState::Done,
            ]
        );
    }

    #[test]
    fn test_fatal_edges() {
        assert_eq!(PipelineState::Resolve.advance(false), PipelineState::Failed);
        assert_eq!(PipelineState::Compile.advance(false), PipelineState::Failed);
        assert_eq!(PipelineState::Simulate.advance(false), PipelineState::Failed);
    }

    #[test]
    fn test_visualize_has_no_failed_edge() {
        assert_eq!(PipelineState::Visualize.advance(false), PipelineState::Done);
    }

    #[test]
    fn test_stage_fatality() {
        assert!(Stage::Compile.is_fatal());
        assert!(Stage::Simulate.is_fatal());
        assert!(!Stage::Visualize.is_fatal());
        assert_eq!(Stage::all().map(|s| s.name()), ["compile", "simulate", "visualize"]);
    }
}
