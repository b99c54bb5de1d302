// ============================================================================
// report.rs - Progress and Final-Result Reporting
// ============================================================================

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use crate::dispatcher::RunOutcome;
use crate::stats::RunStats;
use crate::utils::format_number;
use crate::verifier::{Outcome, Verdict};

/// Pure sink for run progress and the terminal summary. No feedback
/// flows back into the dispatcher.
pub trait Reporter: Send + Sync {
    /// Called at the configured cadence with `(completed, total)` and the
    /// most recently resolved candidate.
    fn progress(&self, completed: u64, total: u64, last_candidate: &str);

    /// Called once per resolved candidate that did not end the run.
    fn candidate_resolved(&self, outcome: &Outcome);

    /// Called exactly once when the run reaches a terminal state.
    fn finished(&self, outcome: &RunOutcome, stats: &RunStats);
}

/// Console reporter: indicatif progress bar plus tracing lines.
pub struct ConsoleReporter {
    bar: ProgressBar,
}

impl ConsoleReporter {
    pub fn new(total: u64) -> Self {
        let bar = ProgressBar::new(total);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        Self { bar }
    }
}

impl Reporter for ConsoleReporter {
    fn progress(&self, completed: u64, total: u64, last_candidate: &str) {
        self.bar.set_position(completed);
        info!(
            "Progress: {}/{} ({:.1}%) - Last checked: '{}'",
            format_number(completed),
            format_number(total),
            completed as f64 / total.max(1) as f64 * 100.0,
            last_candidate
        );
    }

    fn candidate_resolved(&self, outcome: &Outcome) {
        match outcome.verdict {
            Verdict::Incorrect => {
                tracing::debug!("Wrong password: '{}'", outcome.candidate);
            }
            Verdict::Indeterminate => {
                warn!("Error testing password: '{}'", outcome.candidate);
            }
            Verdict::Correct => {}
        }
    }

    fn finished(&self, outcome: &RunOutcome, stats: &RunStats) {
        self.bar.finish_and_clear();

        match outcome {
            RunOutcome::Found { candidate, method } => {
                info!("═══════════════════════════════════════════════");
                info!("PASSWORD FOUND!");
                info!("Password: '{}'", candidate);
                info!("Method: {}", method);
                info!("Use: unrar x -p'{}' <archive>", candidate);
                info!("═══════════════════════════════════════════════");
            }
            RunOutcome::Exhausted => {
                info!(
                    "No correct password found after testing {} candidates",
                    format_number(stats.completed())
                );
            }
        }

        info!("Checked: {}", format_number(stats.completed()));
        info!("Incorrect: {}", format_number(stats.incorrect()));
        info!("Errors: {}", format_number(stats.indeterminate()));
        info!("Rate: {:.2} pw/s", stats.rate());
    }
}

/// Discards everything. Used where progress output is unwanted.
pub struct NullReporter;

impl Reporter for NullReporter {
    fn progress(&self, _completed: u64, _total: u64, _last_candidate: &str) {}
    fn candidate_resolved(&self, _outcome: &Outcome) {}
    fn finished(&self, _outcome: &RunOutcome, _stats: &RunStats) {}
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use parking_lot::Mutex;

    /// Collects every callback for assertion in dispatcher tests.
    pub struct RecordingReporter {
        pub progress_calls: Mutex<Vec<(u64, u64, String)>>,
        pub resolved: Mutex<Vec<Outcome>>,
        pub finished_with: Mutex<Option<RunOutcome>>,
    }

    impl RecordingReporter {
        pub fn new() -> Self {
            Self {
                progress_calls: Mutex::new(Vec::new()),
                resolved: Mutex::new(Vec::new()),
                finished_with: Mutex::new(None),
            }
        }
    }

    impl Reporter for RecordingReporter {
        fn progress(&self, completed: u64, total: u64, last_candidate: &str) {
            self.progress_calls
                .lock()
                .push((completed, total, last_candidate.to_string()));
        }

        fn candidate_resolved(&self, outcome: &Outcome) {
            self.resolved.lock().push(outcome.clone());
        }

        fn finished(&self, outcome: &RunOutcome, _stats: &RunStats) {
            *self.finished_with.lock() = Some(outcome.clone());
        }
    }
}
