//! Terminal rendering of backend events

use crate::backend::BackendEvent;
use crate::queue::{BatchEvent, BatchOutcome};
use indicatif::{ProgressBar, ProgressStyle};

/// Failed sources listed in the final summary
pub const SUMMARY_LIMIT: usize = 5;

const BAR_TEMPLATE: &str =
    "{prefix:>7} [{elapsed_precise}] {wide_bar} {bytes}/{total_bytes} ({bytes_per_sec}, {eta}) {msg}";

/// Draws one progress bar per item and reports the batch summary
pub struct ConsoleView {
    total: usize,
    current: Option<ProgressBar>,
    outcome: Option<BatchOutcome>,
}

impl ConsoleView {
    pub fn new() -> Self {
        Self {
            total: 0,
            current: None,
            outcome: None,
        }
    }

    /// Apply one event; returns false once nothing more is expected
    pub fn handle(&mut self, event: BackendEvent) -> bool {
        match event {
            BackendEvent::Batch(event) => self.handle_batch(event),
            BackendEvent::NetworkProbed { reachable } => {
                if !reachable {
                    eprintln!("⚠ No internet connection detected, downloads may fail");
                }
                true
            }
            BackendEvent::Error(message) => {
                self.abandon("error");
                eprintln!("✗ {}", message);
                false
            }
        }
    }

    pub fn outcome(&self) -> Option<&BatchOutcome> {
        self.outcome.as_ref()
    }

    fn handle_batch(&mut self, event: BatchEvent) -> bool {
        match event {
            BatchEvent::BatchStarted { total, .. } => {
                self.total = total;
                println!("Downloading {} item(s)", total);
            }
            BatchEvent::ItemStarted { index, source } => {
                let bar = ProgressBar::new(0);
                bar.set_style(
                    ProgressStyle::with_template(BAR_TEMPLATE)
                        .unwrap_or_else(|_| ProgressStyle::default_bar()),
                );
                bar.set_prefix(format!("{}/{}", index + 1, self.total));
                bar.set_message(source);
                self.current = Some(bar);
            }
            BatchEvent::ItemProgress { progress, .. } => {
                if let Some(bar) = &self.current {
                    if let Some(total) = progress.total_bytes {
                        bar.set_length(total);
                    }
                    bar.set_position(progress.downloaded_bytes);
                }
            }
            BatchEvent::ItemRetrying {
                next_attempt,
                error,
                delay,
                ..
            } => {
                let line = format!(
                    "⚠ {} (attempt {} in {}s)",
                    error,
                    next_attempt,
                    delay.as_secs()
                );
                match &self.current {
                    Some(bar) => bar.println(line),
                    None => eprintln!("{}", line),
                }
            }
            BatchEvent::ItemSucceeded { .. } => {
                if let Some(bar) = self.current.take() {
                    bar.finish_with_message("✓ done");
                }
            }
            BatchEvent::ItemFailed { error, .. } => {
                self.abandon(&format!("✗ {}", error));
            }
            BatchEvent::ItemCancelled { .. } => self.abandon("stopped"),
            BatchEvent::BatchFinished { outcome, .. } => {
                println!("{}", outcome.summary(SUMMARY_LIMIT));
                self.outcome = Some(outcome);
                return false;
            }
        }
        true
    }

    fn abandon(&mut self, message: &str) {
        if let Some(bar) = self.current.take() {
            bar.abandon_with_message(message.to_string());
        }
    }
}

impl Default for ConsoleView {
    fn default() -> Self {
        Self::new()
    }
}
