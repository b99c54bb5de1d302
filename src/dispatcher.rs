// ============================================================================
// dispatcher.rs - Parallel Candidate Testing with First-Match Cancellation
// ============================================================================

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::report::Reporter;
use crate::stats::RunStats;
use crate::verifier::{Method, Outcome, Verdict, Verify};

/// Terminal state of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Found { candidate: String, method: Method },
    Exhausted,
}

impl RunOutcome {
    pub fn found(&self) -> Option<&str> {
        match self {
            RunOutcome::Found { candidate, .. } => Some(candidate),
            RunOutcome::Exhausted => None,
        }
    }
}

/// Single-writer-wins slot for the correct outcome. Once latched it is
/// never overwritten; ties between concurrent writers are broken by
/// arrival order under the lock, not by candidate value.
struct FoundSlot {
    inner: Mutex<Option<Outcome>>,
}

impl FoundSlot {
    fn new() -> Self {
        Self {
            inner: Mutex::new(None),
        }
    }

    /// Returns true only for the first writer.
    fn latch(&self, outcome: Outcome) -> bool {
        let mut slot = self.inner.lock();
        if slot.is_none() {
            *slot = Some(outcome);
            true
        } else {
            false
        }
    }

    fn is_set(&self) -> bool {
        self.inner.lock().is_some()
    }

    fn take(&self) -> Option<Outcome> {
        self.inner.lock().take()
    }
}

/// Distributes candidates over a bounded pool of workers, latches the
/// first correct outcome, and stops claiming new work from then on.
/// Cancellation is best-effort: a worker already inside an external call
/// finishes that (timeout-bounded) call before observing the stop flag.
pub struct Dispatcher<V> {
    verifier: Arc<V>,
    workers: usize,
    progress_every: u64,
    stats: Arc<RunStats>,
}

impl<V: Verify + 'static> Dispatcher<V> {
    pub fn new(verifier: Arc<V>, workers: usize, progress_every: u64) -> Self {
        Self {
            verifier,
            workers: workers.max(1),
            progress_every: progress_every.max(1),
            stats: Arc::new(RunStats::new()),
        }
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    /// Run one batch to a terminal state. Per run: Idle -> Dispatching ->
    /// {Found, Exhausted}; the found slot is created fresh here, never
    /// shared across runs.
    pub async fn run(
        &self,
        candidates: Vec<String>,
        archive: PathBuf,
        reporter: &dyn Reporter,
    ) -> RunOutcome {
        let total = candidates.len() as u64;
        self.stats.reset(total);

        let candidates = Arc::new(candidates);
        let archive = Arc::new(archive);
        let found = Arc::new(FoundSlot::new());
        let stop = Arc::new(AtomicBool::new(false));
        let cursor = Arc::new(AtomicUsize::new(0));
        let (tx, mut rx) = mpsc::unbounded_channel::<Outcome>();

        let mut handles = Vec::with_capacity(self.workers);
        for worker_id in 0..self.workers {
            let verifier = Arc::clone(&self.verifier);
            let candidates = Arc::clone(&candidates);
            let archive = Arc::clone(&archive);
            let stop = Arc::clone(&stop);
            let cursor = Arc::clone(&cursor);
            let tx = tx.clone();

            handles.push(tokio::spawn(async move {
                loop {
                    if stop.load(Ordering::SeqCst) {
                        debug!("worker {} stopping: result latched", worker_id);
                        break;
                    }
                    let idx = cursor.fetch_add(1, Ordering::SeqCst);
                    let Some(candidate) = candidates.get(idx) else {
                        break;
                    };

                    let outcome = verifier.verify(candidate, &archive).await;
                    if tx.send(outcome).is_err() {
                        break;
                    }
                }
            }));
        }
        drop(tx);

        // Consume outcomes in completion order, which is non-deterministic.
        // After a latch the loop keeps draining in-flight results (a
        // bounded wait: workers claim nothing new once stop is raised).
        while let Some(outcome) = rx.recv().await {
            self.stats.record(&outcome.verdict);
            match outcome.verdict {
                Verdict::Correct => {
                    if found.latch(outcome) {
                        stop.store(true, Ordering::SeqCst);
                    }
                }
                _ => {
                    reporter.candidate_resolved(&outcome);
                    let completed = self.stats.completed();
                    if !found.is_set()
                        && (completed % self.progress_every == 0 || completed == total)
                    {
                        reporter.progress(completed, total, &outcome.candidate);
                    }
                }
            }
        }

        for handle in handles {
            if let Err(e) = handle.await {
                warn!("worker task failed: {}", e);
            }
        }

        let result = match found.take() {
            Some(outcome) => RunOutcome::Found {
                candidate: outcome.candidate,
                method: outcome.method,
            },
            None => RunOutcome::Exhausted,
        };
        reporter.finished(&result, &self.stats);
        result
    }
}

/// Default pool size: available parallelism minus one, minimum 1.
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get().saturating_sub(1))
        .unwrap_or(1)
        .max(1)
}
