use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

/// Resolve an HDL build target and run it through the simulation toolchain.
///
/// The target's include graph is flattened into a deduplicated source list,
/// which is compiled, simulated and finally opened in a waveform viewer.
/// Compile and simulate failures exit with status 1; viewer problems are
/// reported as warnings only.
///
/// EXAMPLES:
///     simrun                       Build and simulate the default target
///     simrun pid_testbench         Build and simulate a specific target
///     simrun --dry-run alu         Show resolved sources without running tools
///     simrun --list                List targets in the registry
///     simrun --no-view             Skip the waveform viewer
///
/// ENVIRONMENT VARIABLES:
///     SIMRUN_REGISTRY     Registry file (relative to the project root)
///     SIMRUN_COMPILER     Compiler program (default: iverilog)
///     SIMRUN_SIMULATOR    Simulator program (default: vvp)
///     SIMRUN_VIEWER       Waveform viewer program (default: gtkwave)
///     SIMRUN_TRACE_FILE   Trace file name (default: dump.vcd)
///     SIMRUN_NO_VIEW      Set to '1' to skip the waveform viewer
///     SIMRUN_JSON         Set to '1' for JSON output by default
///     SIMRUN_LOG          Log filter (e.g. 'debug', 'simrun_build=trace')
///     NO_COLOR            Set to disable colored output
#[derive(Parser)]
#[command(name = "simrun")]
#[command(version)]
struct Cli {
    /// Target to build (defaults to the registry's default_target)
    target: Option<String>,

    /// Target registry file (JSON, or TOML by extension)
    #[arg(long, short = 'r')]
    registry: Option<PathBuf>,

    /// Path to simrun.toml (default: search upward from the current directory)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Skip the waveform viewer
    #[arg(long)]
    no_view: bool,

    /// Resolve and print the build plan without running any tool
    #[arg(long, short = 'n')]
    dry_run: bool,

    /// List targets in the registry
    #[arg(long, short = 'l', conflicts_with_all = ["dry_run", "no_view"])]
    list: bool,

    /// JSON output
    #[arg(long, env = "SIMRUN_JSON")]
    json: bool,

    /// Verbose output (command lines, timings, debug logs)
    #[arg(long, short = 'v', conflicts_with = "quiet")]
    verbose: bool,

    /// Quiet output (errors only)
    #[arg(long, short = 'q')]
    quiet: bool,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("SIMRUN_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);
    if cli.no_color {
        colored::control::set_override(false);
    }

    if cli.list {
        return commands::list::run(commands::list::ListArgs {
            registry: cli.registry,
            config: cli.config,
            json: cli.json,
        });
    }

    commands::run::run(commands::run::RunArgs {
        target: cli.target,
        registry: cli.registry,
        config: cli.config,
        no_view: cli.no_view,
        dry_run: cli.dry_run,
        verbose: cli.verbose,
        quiet: cli.quiet,
        json: cli.json,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_positional_target_is_optional() {
        let cli = Cli::try_parse_from(["simrun"]).unwrap();
        assert!(cli.target.is_none());

        let cli = Cli::try_parse_from(["simrun", "pid"]).unwrap();
        assert_eq!(cli.target.as_deref(), Some("pid"));
    }

    #[test]
    fn test_verbose_conflicts_with_quiet() {
        assert!(Cli::try_parse_from(["simrun", "-v", "-q"]).is_err());
    }

    #[test]
    fn test_list_conflicts_with_dry_run() {
        assert!(Cli::try_parse_from(["simrun", "--list", "--dry-run"]).is_err());
    }
}
