//! Terminal output for the `unmand` binary: spinners and colored output.
//!
//! [`PollProgress`] is the console [`ProgressSink`]: it keeps a spinner
//! running while an extraction is polled and prints the outcome.

use std::time::Duration;

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::error::UnmandError;
use crate::extraction::{Extraction, Status};
use crate::poller::{ProgressEvent, ProgressSink};

/// Spinner tracking one extraction in the terminal.
#[derive(Clone)]
pub struct PollProgress {
    pb: ProgressBar,
    green: Style,
    red: Style,
    yellow: Style,
}

impl PollProgress {
    /// Starts the spinner with the extraction's initial status.
    pub fn start(extraction: &Extraction) -> Self {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            pb.set_style(style);
        }
        pb.set_message(format!("{}: {}", extraction.id(), extraction.status()));
        pb.enable_steady_tick(Duration::from_millis(100));

        Self {
            pb,
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
            yellow: Style::new().yellow(),
        }
    }

    /// Clears the spinner and prints the final status.
    pub fn complete(&self, extraction: &Extraction) {
        self.pb.finish_and_clear();
        match extraction.status() {
            Status::Finished => {
                println!(
                    "  {} Extraction {} completed",
                    self.green.apply_to("✓"),
                    extraction.id()
                );
            }
            Status::Failed => {
                println!(
                    "  {} Extraction {} failed",
                    self.red.apply_to("✗"),
                    extraction.id()
                );
            }
            other => {
                println!(
                    "  {} Extraction {} still {other}",
                    self.yellow.apply_to("…"),
                    extraction.id()
                );
            }
        }
    }

    /// Clears the spinner and prints why polling stopped.
    pub fn abort(&self, err: &UnmandError) {
        self.pb.finish_and_clear();
        eprintln!("  {} {err}", self.red.apply_to("✗"));
    }
}

impl ProgressSink for PollProgress {
    fn on_progress(&self, event: &ProgressEvent) {
        let message = match event.estimate {
            Some(estimate) => format!(
                "{}: {} (attempt {}, ~{:.1}s remaining)",
                event.id,
                event.status,
                event.attempt,
                estimate.as_secs_f64()
            ),
            None => format!("{}: {} (attempt {})", event.id, event.status, event.attempt),
        };
        self.pb.set_message(message);
    }
}

/// Prints a JSON value with a colored header.
pub fn print_json(title: &str, value: &serde_json::Value) {
    let header = Style::new().cyan().bold();
    println!();
    println!("{}", header.apply_to(format!("─── {title} ───")));
    println!(
        "{}",
        serde_json::to_string_pretty(value).unwrap_or_default()
    );
}
