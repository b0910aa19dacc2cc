//! Step status and reporting types.

use std::time::Duration;

/// Status of a provisioning step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    /// Step ran and made (or verified) its changes.
    Completed,

    /// Step had nothing to do (guard satisfied, dry run, or filtered out).
    Skipped,

    /// Step failed. Fatal only for critical steps.
    Failed,
}

impl StepStatus {
    /// Get a display character for this status.
    pub fn display_char(&self) -> char {
        match self {
            StepStatus::Completed => '✓',
            StepStatus::Failed => '✗',
            StepStatus::Skipped => '⊘',
        }
    }
}

impl std::fmt::Display for StepStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StepStatus::Completed => "completed",
            StepStatus::Failed => "failed",
            StepStatus::Skipped => "skipped",
        };
        write!(f, "{}", s)
    }
}

/// What a successful step action amounted to.
#[derive(Debug, Clone)]
pub enum StepOutcome {
    /// Guard was already satisfied; nothing ran.
    AlreadyPresent,

    /// The install procedure ran.
    Installed,

    /// Step ran and produced a summary line.
    Done(String),
}

/// Report for one executed (or skipped) step.
#[derive(Debug, Clone)]
pub struct StepReport {
    /// Step name.
    pub name: String,

    /// Final status.
    pub status: StepStatus,

    /// Execution duration.
    pub duration: Duration,

    /// Human-readable detail ("already present", error text, counts).
    pub detail: Option<String>,
}

impl StepReport {
    /// Generate a summary line for display.
    pub fn summary_line(&self) -> String {
        let glyph = self.status.display_char();
        match (&self.status, &self.detail) {
            (StepStatus::Completed, _) => {
                format!("{} {} ({})", glyph, self.name, format_duration(self.duration))
            }
            (StepStatus::Skipped, Some(detail)) => format!("{} {} ({})", glyph, self.name, detail),
            (StepStatus::Skipped, None) => format!("{} {}", glyph, self.name),
            (StepStatus::Failed, detail) => format!(
                "{} {} - {}",
                glyph,
                self.name,
                detail.as_deref().unwrap_or("unknown error")
            ),
        }
    }
}

/// Format a duration the way the run summary shows it.
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    let millis = duration.subsec_millis();

    if secs == 0 {
        format!("{}ms", millis)
    } else if secs < 60 {
        format!("{}.{}s", secs, millis / 100)
    } else {
        let mins = secs / 60;
        let secs = secs % 60;
        format!("{}m {}s", mins, secs)
    }
}
