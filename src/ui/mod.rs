//! Terminal status reporting.
//!
//! A thin layer over `console` and `indicatif`: a spinner while a step
//! runs, a glyph-prefixed summary line when it finishes, and a final
//! run summary. Quiet mode reduces output to failures and the summary.

use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::provision::step::{format_duration, StepReport, StepStatus};

/// Output verbosity mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Show all output including per-step detail.
    Verbose,
    /// Show progress and status only.
    #[default]
    Normal,
    /// Show failures and the final summary only.
    Quiet,
}

/// Renders step progress to the terminal.
pub struct Reporter {
    mode: OutputMode,
    spinner: Option<ProgressBar>,
}

impl Reporter {
    pub fn new(mode: OutputMode) -> Self {
        Self {
            mode,
            spinner: None,
        }
    }

    /// Get the current output mode.
    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    /// A step is starting.
    pub fn step_started(&mut self, index: usize, total: usize, name: &str) {
        if self.mode == OutputMode::Quiet {
            return;
        }

        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner} {msg}")
                .expect("static template must parse"),
        );
        spinner.set_message(format!("[{}/{}] {}", index, total, name));
        spinner.enable_steady_tick(Duration::from_millis(80));
        self.spinner = Some(spinner);
    }

    /// A step finished; print its summary line.
    pub fn step_finished(&mut self, report: &StepReport) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }

        match report.status {
            StepStatus::Failed => {
                eprintln!("{}", style(report.summary_line()).red());
            }
            StepStatus::Completed => {
                if self.mode != OutputMode::Quiet {
                    println!("{}", style(report.summary_line()).green());
                }
            }
            StepStatus::Skipped => {
                if self.mode != OutputMode::Quiet {
                    println!("{}", style(report.summary_line()).dim());
                }
            }
        }

        if self.mode == OutputMode::Verbose {
            if let Some(detail) = &report.detail {
                if report.status == StepStatus::Completed {
                    println!("  {}", style(detail).dim());
                }
            }
        }
    }

    /// Print an informational message.
    pub fn message(&self, msg: &str) {
        if self.mode != OutputMode::Quiet {
            println!("{}", msg);
        }
    }

    /// Print a warning.
    pub fn warning(&self, msg: &str) {
        eprintln!("{}", style(msg).yellow());
    }

    /// Print an error.
    pub fn error(&self, msg: &str) {
        eprintln!("{}", style(msg).red());
    }

    /// Print the final run summary.
    pub fn summary(&self, reports: &[StepReport], total: Duration) {
        let completed = reports
            .iter()
            .filter(|r| r.status == StepStatus::Completed)
            .count();
        let skipped = reports
            .iter()
            .filter(|r| r.status == StepStatus::Skipped)
            .count();
        let failed = reports
            .iter()
            .filter(|r| r.status == StepStatus::Failed)
            .count();

        let line = format!(
            "{} completed, {} skipped, {} failed in {}",
            completed,
            skipped,
            failed,
            format_duration(total)
        );

        if failed > 0 {
            eprintln!("{}", style(line).yellow());
        } else {
            println!("{}", style(line).green());
        }
    }
}
