// ============================================================================
// stats.rs - Real-time Run Statistics
// ============================================================================

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::verifier::Verdict;

/// Thread-safe per-run counters. Reset at the start of each run,
/// mutated by workers as verifications resolve.
pub struct RunStats {
    total: AtomicU64,
    completed: AtomicU64,
    incorrect: AtomicU64,
    indeterminate: AtomicU64,
    start_time: AtomicU64, // Unix timestamp in seconds (thread-safe)
}

impl RunStats {
    pub fn new() -> Self {
        Self {
            total: AtomicU64::new(0),
            completed: AtomicU64::new(0),
            incorrect: AtomicU64::new(0),
            indeterminate: AtomicU64::new(0),
            start_time: AtomicU64::new(now_secs()),
        }
    }

    /// Record one resolved verification.
    pub fn record(&self, verdict: &Verdict) {
        self.completed.fetch_add(1, Ordering::SeqCst);
        match verdict {
            Verdict::Incorrect => {
                self.incorrect.fetch_add(1, Ordering::Relaxed);
            }
            Verdict::Indeterminate => {
                self.indeterminate.fetch_add(1, Ordering::Relaxed);
            }
            Verdict::Correct => {}
        }
    }

    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn incorrect(&self) -> u64 {
        self.incorrect.load(Ordering::Relaxed)
    }

    pub fn indeterminate(&self) -> u64 {
        self.indeterminate.load(Ordering::Relaxed)
    }

    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    pub fn elapsed(&self) -> f64 {
        let start = self.start_time.load(Ordering::Relaxed);
        now_secs().saturating_sub(start) as f64
    }

    pub fn rate(&self) -> f64 {
        let completed = self.completed() as f64;
        let elapsed = self.elapsed();
        if elapsed > 0.0 {
            completed / elapsed
        } else {
            0.0
        }
    }

    /// Reset counters for a new run of `total` candidates.
    pub fn reset(&self, total: u64) {
        self.total.store(total, Ordering::Relaxed);
        self.completed.store(0, Ordering::SeqCst);
        self.incorrect.store(0, Ordering::Relaxed);
        self.indeterminate.store(0, Ordering::Relaxed);
        self.start_time.store(now_secs(), Ordering::Relaxed);
    }
}

impl Default for RunStats {
    fn default() -> Self {
        Self::new()
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_classifies_verdicts() {
        let stats = RunStats::new();
        stats.reset(4);

        stats.record(&Verdict::Incorrect);
        stats.record(&Verdict::Incorrect);
        stats.record(&Verdict::Indeterminate);
        stats.record(&Verdict::Correct);

        assert_eq!(stats.completed(), 4);
        assert_eq!(stats.incorrect(), 2);
        assert_eq!(stats.indeterminate(), 1);
        assert_eq!(stats.total(), 4);
    }

    #[test]
    fn test_reset_clears_counters() {
        let stats = RunStats::new();
        stats.reset(10);
        stats.record(&Verdict::Incorrect);
        assert_eq!(stats.completed(), 1);

        stats.reset(5);
        assert_eq!(stats.completed(), 0);
        assert_eq!(stats.incorrect(), 0);
        assert_eq!(stats.total(), 5);
    }
}
