//! Run command - resolve a target and drive compile, simulate and visualize

use super::{load_config, load_registry};
use anyhow::Result;
use colored::*;
use simrun_build::{
    BuildPlan, BuildProgress, OutputMode, Pipeline, RevisitKind, ToolCommand, ToolStdout,
    ToolchainConfig,
};
use simrun_config::ProjectConfig;
use std::path::PathBuf;

/// Run command arguments
#[derive(Default)]
pub struct RunArgs {
    /// Target to build (registry default when absent)
    pub target: Option<String>,
    /// Registry file overriding the configured one
    pub registry: Option<PathBuf>,
    /// Explicit simrun.toml
    pub config: Option<PathBuf>,
    /// Skip the waveform viewer
    pub no_view: bool,
    /// Print the plan without running tools
    pub dry_run: bool,
    /// Verbose output
    pub verbose: bool,
    /// Quiet output (errors only)
    pub quiet: bool,
    /// JSON output
    pub json: bool,
}

/// Run the pipeline for one target
pub fn run(args: RunArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let registry = load_registry(args.registry.clone(), &config)?;

    let target_id = args
        .target
        .clone()
        .unwrap_or_else(|| registry.default_target_id().to_string());

    let pipeline = Pipeline::new(&registry)
        .with_tool_stdout(tool_stdout(&args))
        .with_toolchain(toolchain_from_config(&config.project, args.no_view))
        .with_base_dir(&config.root)
        .with_progress(BuildProgress::new(determine_output_mode(&args)));

    if args.dry_run {
        let plan = pipeline.plan(&target_id)?;
        if args.json {
            println!("{}", serde_json::to_string_pretty(&plan)?);
        } else {
            print_plan(&plan);
        }
        return Ok(());
    }

    let report = pipeline.run(&target_id)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    Ok(())
}

/// Build the toolchain from merged configuration and CLI flags
fn toolchain_from_config(project: &ProjectConfig, no_view: bool) -> ToolchainConfig {
    let tool = |(program, args): (String, Vec<String>)| ToolCommand::new(program).with_args(args);

    ToolchainConfig {
        compiler: tool(project.compiler()),
        simulator: tool(project.simulator()),
        viewer: tool(project.viewer()),
        artifact_extension: project.artifact_extension().to_string(),
        trace_file: project.trace_file().to_string(),
        visualize: project.visualize() && !no_view,
    }
}

/// Determine output mode from arguments
fn determine_output_mode(args: &RunArgs) -> OutputMode {
    if args.json {
        OutputMode::Json
    } else if args.quiet {
        OutputMode::Quiet
    } else if args.verbose {
        OutputMode::Verbose
    } else {
        OutputMode::Normal
    }
}

/// Keep stdout clean for the JSON report
fn tool_stdout(args: &RunArgs) -> ToolStdout {
    if args.json {
        ToolStdout::Stderr
    } else {
        ToolStdout::Inherit
    }
}

fn print_plan(plan: &BuildPlan) {
    let resolution = &plan.resolution;
    println!("{} {}", "Target:".bold(), plan.target());
    println!(
        "{} {}",
        "Working directory:".bold(),
        plan.working_dir.display()
    );
    println!("{} {}", "Artifact:".bold(), plan.artifact.display());
    println!("{} {}", "Trace:".bold(), plan.trace.display());
    println!("{} ({})", "Sources".bold(), plan.sources().len());
    for source in plan.sources() {
        println!("  {}", source);
    }

    if !resolution.revisits.is_empty() {
        println!("{}", "Revisited targets".bold());
        for revisit in &resolution.revisits {
            let kind = match revisit.kind {
                RevisitKind::Cycle => "cycle".yellow(),
                RevisitKind::Shared => "shared".normal(),
            };
            println!(
                "  {} (included by {}, {})",
                revisit.target, revisit.included_by, kind
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_determine_output_mode_default() {
        let args = RunArgs::default();
        assert_eq!(determine_output_mode(&args), OutputMode::Normal);
    }

    #[test]
    fn test_determine_output_mode_json_wins() {
        let args = RunArgs {
            json: true,
            verbose: true,
            ..Default::default()
        };
        assert_eq!(determine_output_mode(&args), OutputMode::Json);
    }

    #[test]
    fn test_determine_output_mode_quiet() {
        let args = RunArgs {
            quiet: true,
            ..Default::default()
        };
        assert_eq!(determine_output_mode(&args), OutputMode::Quiet);
    }

    #[test]
    fn test_json_sends_tool_stdout_to_stderr() {
        assert_eq!(tool_stdout(&RunArgs::default()), ToolStdout::Inherit);
        let args = RunArgs {
            json: true,
            ..Default::default()
        };
        assert_eq!(tool_stdout(&args), ToolStdout::Stderr);
    }

    #[test]
    fn test_toolchain_defaults() {
        let toolchain = toolchain_from_config(&ProjectConfig::default(), false);
        assert_eq!(toolchain, ToolchainConfig::default());
    }

    #[test]
    fn test_no_view_flag_disables_viewer() {
        let toolchain = toolchain_from_config(&ProjectConfig::default(), true);
        assert!(!toolchain.visualize);
    }
}
