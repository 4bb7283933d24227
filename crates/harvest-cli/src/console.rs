//! Console output: status lines and the progress bar, both on stderr.
//!
//! Stdout is reserved for the JSON document.

use colored::*;
use harvest_core::domain::{Delivery, HarvestEvent};
use harvest_core::ports::{EventSink, ProgressSink};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

const BAR_TEMPLATE: &str = " {bar:40} {percent}% | ETA: {eta} | {pos}/{len}";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tone {
    Info,
    Success,
    Error,
}

/// One rendered status line, before coloring.
#[derive(Debug, Clone, PartialEq, Eq)]
struct StatusLine {
    tone: Tone,
    text: String,
}

impl StatusLine {
    fn info(text: impl Into<String>) -> Self {
        Self {
            tone: Tone::Info,
            text: text.into(),
        }
    }

    fn success(text: impl Into<String>) -> Self {
        Self {
            tone: Tone::Success,
            text: text.into(),
        }
    }

    fn error(text: impl Into<String>) -> Self {
        Self {
            tone: Tone::Error,
            text: text.into(),
        }
    }

    fn colored(&self) -> ColoredString {
        match self.tone {
            Tone::Info => format!("i {}", self.text).cyan().bold(),
            Tone::Success => format!("✔ {}", self.text).green().bold(),
            Tone::Error => format!("x {}", self.text).red().bold(),
        }
    }
}

/// Status lines for an event. Some events render nothing.
fn render(event: &HarvestEvent) -> Vec<StatusLine> {
    match event {
        HarvestEvent::ListingRecords => {
            vec![StatusLine::info("Listing all AWS managed policies...")]
        }
        HarvestEvent::RecordsListed { eligible, .. } => vec![StatusLine::info(format!(
            "Found {eligible} AWS managed policies. Extracting their details..."
        ))],
        HarvestEvent::LookupAttemptFailed { arn, error } => {
            vec![StatusLine::error(format!("Failed to get ARN {arn}. {error}"))]
        }
        HarvestEvent::Retrying { retry, .. } => {
            vec![StatusLine::info(format!("Retrying ({retry})..."))]
        }
        HarvestEvent::LookupFailed {
            policy,
            attempts: 0,
            error,
        } => vec![StatusLine::error(format!(
            "Failed to get policy {policy} ({error}). Skipping it."
        ))],
        HarvestEvent::LookupFailed {
            policy, attempts, ..
        } => vec![StatusLine::error(format!(
            "Failed to get policy {policy} even after {attempts} attempts. Skipping it."
        ))],
        HarvestEvent::ParseFailed { policy, raw } => vec![
            StatusLine::error(format!("Failed to parse policy {policy} to JSON.")),
            StatusLine::error(raw.clone()),
        ],
        HarvestEvent::Resolved(summary) => vec![StatusLine::success(format!(
            "{summary} policies were successfully resolved"
        ))],
        HarvestEvent::Delivered {
            count,
            delivery: Delivery::File(path),
        } => vec![StatusLine::success(format!(
            "{count} policies successfully saved to {}",
            path.display()
        ))],
        HarvestEvent::Delivered {
            delivery: Delivery::Stdout,
            ..
        } => Vec::new(),
    }
}

/// Progress bar and status line printer for a run.
pub struct Console {
    silent: bool,
    bar: ProgressBar,
}

impl Console {
    pub fn new(silent: bool) -> Self {
        let bar = ProgressBar::hidden();
        if let Ok(style) = ProgressStyle::with_template(BAR_TEMPLATE) {
            bar.set_style(style.progress_chars("█░"));
        }
        Self { silent, bar }
    }

    fn print(&self, line: &StatusLine) {
        self.bar.suspend(|| eprintln!("{}", line.colored()));
    }
}

impl ProgressSink for Console {
    fn start(&self, total: u64) {
        self.bar.set_length(total);
        self.bar.set_position(0);
        if !self.silent {
            self.bar.set_draw_target(ProgressDrawTarget::stderr());
        }
    }

    fn advance(&self) {
        self.bar.inc(1);
    }

    fn stop(&self) {
        self.bar.finish();
    }
}

impl EventSink for Console {
    fn emit(&self, event: HarvestEvent) {
        if self.silent {
            return;
        }
        for line in render(&event) {
            self.print(&line);
        }
    }
}
