//! simrun build infrastructure
//!
//! Resolves a named build target into an ordered source list and working
//! directory, then drives an external HDL toolchain against it:
//! - Target registry loading and validation (JSON or TOML)
//! - Include-graph resolution with source deduplication
//! - Sequential compile / simulate / visualize pipeline
//! - Progress reporting

pub mod error;
pub mod output;
pub mod pipeline;
pub mod registry;
pub mod resolver;
pub mod targets;
pub mod tools;

// Re-export main types
pub use error::{BuildError, BuildResult, BuildWarning};
pub use output::{BuildProgress, OutputMode};
pub use pipeline::{
    BuildPlan, Pipeline, PipelineReport, PipelineState, Stage, StageOutcome, StageRecord,
    StageStatus,
};
pub use registry::TargetRegistry;
pub use resolver::{resolve, Resolution, Revisit, RevisitKind};
pub use targets::{Target, DEFAULT_OUTPUTS_DIR};
pub use tools::{
    ProcessRunner, ToolCommand, ToolExit, ToolInvocation, ToolRunner, ToolStdout, ToolchainConfig,
};
