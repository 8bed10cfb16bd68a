//! Progress reporting and output formatting

use crate::error::BuildWarning;
use crate::pipeline::Stage;
use crate::tools::ToolInvocation;
use colored::*;
use std::time::Duration;

/// How much the pipeline prints while running
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Stage headers and warnings
    #[default]
    Normal,
    /// Also print full command lines and timings
    Verbose,
    /// Errors only
    Quiet,
    /// Nothing while running; the caller prints a JSON summary
    Json,
}

/// Prints pipeline progress to the terminal
#[derive(Debug, Clone, Default)]
pub struct BuildProgress {
    mode: OutputMode,
}

impl BuildProgress {
    /// Create a new progress reporter
    pub fn new(mode: OutputMode) -> Self {
        Self { mode }
    }

    /// Output mode in effect
    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    fn shows_progress(&self) -> bool {
        matches!(self.mode, OutputMode::Normal | OutputMode::Verbose)
    }

    /// Announce a stage about to run
    pub fn stage_started(&self, stage: Stage, invocation: &ToolInvocation) {
        if !self.shows_progress() {
            return;
        }
        let headline = match stage {
            Stage::Compile => format!(
                "Compiling sources in {}...",
                invocation.cwd.display()
            ),
            Stage::Simulate => "Running simulation...".to_string(),
            Stage::Visualize => "Opening waveform viewer...".to_string(),
        };
        println!("{} {}", "==>".cyan().bold(), headline);
        if self.mode == OutputMode::Verbose {
            println!("    {}", invocation.command_line().dimmed());
        }
    }

    /// Report a finished stage
    pub fn stage_finished(&self, stage: Stage, duration: Duration) {
        if self.mode == OutputMode::Verbose {
            println!("    {} {} ({:.2?})", "done".green(), stage, duration);
        }
    }

    /// Report a skipped stage
    pub fn stage_skipped(&self, stage: Stage) {
        if self.mode == OutputMode::Verbose {
            println!("    {} {}", "skipped".yellow(), stage);
        }
    }

    /// Report a non-fatal problem
    pub fn warning(&self, warning: &BuildWarning) {
        if self.mode == OutputMode::Json {
            return;
        }
        eprintln!("{} {}", "warning:".yellow().bold(), warning);
    }

    /// Report overall success
    pub fn finished(&self, target: &str, total: Duration, warnings: usize) {
        if !self.shows_progress() {
            return;
        }
        let suffix = if warnings > 0 {
            format!(" with {} warning(s)", warnings)
        } else {
            String::new()
        };
        println!(
            "{} target '{}' in {:.2}s{}",
            "Finished".green().bold(),
            target,
            total.as_secs_f64(),
            suffix
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_mode_is_normal() {
        assert_eq!(BuildProgress::default().mode(), OutputMode::Normal);
    }

    #[test]
    fn test_progress_visibility() {
        assert!(BuildProgress::new(OutputMode::Normal).shows_progress());
        assert!(BuildProgress::new(OutputMode::Verbose).shows_progress());
        assert!(!BuildProgress::new(OutputMode::Quiet).shows_progress());
        assert!(!BuildProgress::new(OutputMode::Json).shows_progress());
    }
}
