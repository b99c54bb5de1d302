use std::future::Future;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::{debug, warn};

/// Marker unrar prints when an archive tests clean under the password.
const SUCCESS_MARKER: &str = "All OK";

/// Markers unrar prints when the password is definitively wrong.
/// Locale-stable in practice; any change in unrar messaging breaks this
/// contract externally, not here.
const FAILURE_MARKERS: [&str; 2] = ["Incorrect password", "Wrong password"];

/// Outcome classification of one verification attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Correct,
    Incorrect,
    Indeterminate,
}

/// Which strategy produced the verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Method {
    /// `unrar t` reported a clean test
    PrimaryTest,
    /// `unrar lt` listed real contents under the password
    SecondaryListing,
    /// A definitive wrong-password marker appeared
    Wrong,
    /// Timeout, spawn failure, or no conclusive signal
    Error,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::PrimaryTest => "primary-test",
            Method::SecondaryListing => "secondary-listing",
            Method::Wrong => "wrong",
            Method::Error => "error",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of testing one candidate. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Outcome {
    pub candidate: String,
    pub verdict: Verdict,
    pub method: Method,
}

impl Outcome {
    pub fn new(candidate: &str, verdict: Verdict, method: Method) -> Self {
        Self {
            candidate: candidate.to_string(),
            verdict,
            method,
        }
    }

    fn error(candidate: &str) -> Self {
        Self::new(candidate, Verdict::Indeterminate, Method::Error)
    }
}

/// The two unrar operation modes the verifier uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolOp {
    /// `unrar t` - test archive integrity with password
    Test,
    /// `unrar lt` - list archive contents with password, including verify
    ListVerify,
}

impl ToolOp {
    pub fn flag(&self) -> &'static str {
        match self {
            ToolOp::Test => "t",
            ToolOp::ListVerify => "lt",
        }
    }
}

/// Captured output of one external invocation.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Exit status indicated success
    pub success: bool,
    /// Combined stdout + stderr text
    pub text: String,
}

/// Injectable external-process capability. The verifier is testable by
/// substituting this with a canned implementation.
pub trait ToolRunner: Send + Sync {
    fn run<'a>(
        &'a self,
        op: ToolOp,
        password: &'a str,
        archive: &'a Path,
    ) -> impl Future<Output = Result<ToolOutput>> + Send + 'a;
}

/// Real unrar invocation, bounded by a hard per-call timeout so one hung
/// process never stalls a worker indefinitely.
pub struct UnrarRunner {
    bin: String,
    timeout: Duration,
}

impl UnrarRunner {
    pub fn new(bin: &str, timeout: Duration) -> Self {
        Self {
            bin: bin.to_string(),
            timeout,
        }
    }
}

impl ToolRunner for UnrarRunner {
    fn run<'a>(
        &'a self,
        op: ToolOp,
        password: &'a str,
        archive: &'a Path,
    ) -> impl Future<Output = Result<ToolOutput>> + Send + 'a {
        async move {
            let child = Command::new(&self.bin)
                .arg(op.flag())
                .arg(format!("-p{}", password))
                .arg(archive)
                .kill_on_drop(true)
                .output();

            let output = tokio::time::timeout(self.timeout, child)
                .await
                .context(format!("unrar {} timed out", op.flag()))?
                .context(format!("failed to spawn {}", self.bin))?;

            let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
            text.push_str(&String::from_utf8_lossy(&output.stderr));

            Ok(ToolOutput {
                success: output.status.success(),
                text,
            })
        }
    }
}

/// Verification capability consumed by the dispatcher.
pub trait Verify: Send + Sync {
    fn verify<'a>(
        &'a self,
        candidate: &'a str,
        archive: &'a Path,
    ) -> impl Future<Output = Outcome> + Send + 'a;
}

/// Two-tier password verifier. RAR5 archives sometimes exit clean from
/// `unrar t` without printing any marker; a second `unrar lt` pass
/// resolves that ambiguity.
pub struct ArchiveVerifier<R> {
    runner: R,
}

impl<R: ToolRunner> ArchiveVerifier<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    /// Test one candidate. Never fails out: every timeout, spawn error,
    /// or inconclusive signal resolves to an Indeterminate outcome.
    pub async fn verify_candidate(&self, candidate: &str, archive: &Path) -> Outcome {
        let primary = match self.runner.run(ToolOp::Test, candidate, archive).await {
            Ok(out) => out,
            Err(e) => {
                warn!("primary test failed for candidate: {}", e);
                return Outcome::error(candidate);
            }
        };

        if primary.text.contains(SUCCESS_MARKER) {
            return Outcome::new(candidate, Verdict::Correct, Method::PrimaryTest);
        }

        if contains_failure_marker(&primary.text) {
            return Outcome::new(candidate, Verdict::Incorrect, Method::Wrong);
        }

        if !primary.success {
            return Outcome::error(candidate);
        }

        // Exit success but no marker either way: fall back to listing
        debug!("ambiguous primary test, falling back to listing");
        let secondary = match self
            .runner
            .run(ToolOp::ListVerify, candidate, archive)
            .await
        {
            Ok(out) => out,
            Err(e) => {
                warn!("secondary listing failed for candidate: {}", e);
                return Outcome::error(candidate);
            }
        };

        if contains_failure_marker(&secondary.text) {
            return Outcome::new(candidate, Verdict::Incorrect, Method::Wrong);
        }

        if secondary.success && looks_like_listing(&secondary.text) {
            return Outcome::new(candidate, Verdict::Correct, Method::SecondaryListing);
        }

        Outcome::error(candidate)
    }
}

impl<R: ToolRunner> Verify for ArchiveVerifier<R> {
    fn verify<'a>(
        &'a self,
        candidate: &'a str,
        archive: &'a Path,
    ) -> impl Future<Output = Outcome> + Send + 'a {
        self.verify_candidate(candidate, archive)
    }
}

fn contains_failure_marker(text: &str) -> bool {
    FAILURE_MARKERS.iter().any(|m| text.contains(m))
}

/// Heuristic positive evidence that `unrar lt` printed a real directory
/// listing. Inherited from unrar's inconsistent RAR5 messaging; kept
/// isolated so it can be swapped without touching the protocol.
fn looks_like_listing(text: &str) -> bool {
    text.contains("README") || text.contains(".txt") || text.to_lowercase().contains("files")
}

/// Convenience constructor wiring the real runner.
pub fn unrar_verifier(bin: &str, timeout: Duration) -> ArchiveVerifier<UnrarRunner> {
    ArchiveVerifier::new(UnrarRunner::new(bin, timeout))
}
