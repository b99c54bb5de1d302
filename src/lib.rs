// lib.rs - RAR Password Recovery Library
// Parallel candidate testing + combinatorial wordlist generation

pub mod candidates;
pub mod config;
pub mod dispatcher;
pub mod report;
pub mod stats;
pub mod verifier;
pub mod wordlist;

// Re-exports for convenience
pub use candidates::CandidateSource;
pub use config::Config;
pub use dispatcher::{Dispatcher, RunOutcome};
pub use report::{ConsoleReporter, Reporter};
pub use stats::RunStats;
pub use verifier::{
    ArchiveVerifier, Method, Outcome, ToolOp, ToolOutput, ToolRunner, UnrarRunner, Verdict, Verify,
};
pub use wordlist::{GeneratorOptions, WordlistGenerator};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Error types
pub mod error {
    use thiserror::Error;

    #[derive(Error, Debug)]
    pub enum GrindError {
        #[error("Configuration error: {0}")]
        Config(String),

        #[error("Archive not found: {0}")]
        ArchiveMissing(String),

        #[error("Wordlist error: {0}")]
        Wordlist(String),

        #[error("Empty candidate source: {0}")]
        EmptySource(String),

        #[error("IO error: {0}")]
        Io(#[from] std::io::Error),

        #[error("JSON error: {0}")]
        Json(#[from] serde_json::Error),
    }

    pub type Result<T> = std::result::Result<T, GrindError>;
}

/// Utilities module
pub mod utils {

    /// Format duration in human-readable format
    pub fn format_duration(seconds: f64) -> String {
        if seconds < 60.0 {
            format!("{:.1}s", seconds)
        } else if seconds < 3600.0 {
            format!("{:.1}m", seconds / 60.0)
        } else if seconds < 86400.0 {
            format!("{:.1}h", seconds / 3600.0)
        } else {
            format!("{:.1}d", seconds / 86400.0)
        }
    }

    /// Format number with thousands separator
    pub fn format_number(n: u64) -> String {
        let s = n.to_string();
        let mut result = String::new();
        for (i, c) in s.chars().rev().enumerate() {
            if i > 0 && i % 3 == 0 {
                result.push(',');
            }
            result.push(c);
        }
        result.chars().rev().collect()
    }

    /// Estimate time remaining given current progress and rate
    pub fn estimate_remaining(completed: u64, total: u64, rate: f64) -> Option<String> {
        if rate <= 0.0 || completed >= total {
            return None;
        }
        let remaining = (total - completed) as f64 / rate;
        Some(format_duration(remaining))
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_format_number() {
            assert_eq!(format_number(1234567), "1,234,567");
            assert_eq!(format_number(999), "999");
        }

        #[test]
        fn test_format_duration() {
            assert_eq!(format_duration(30.0), "30.0s");
            assert_eq!(format_duration(120.0), "2.0m");
            assert_eq!(format_duration(7200.0), "2.0h");
        }

        #[test]
        fn test_estimate_remaining() {
            assert_eq!(estimate_remaining(50, 100, 10.0), Some("5.0s".to_string()));
            assert_eq!(estimate_remaining(100, 100, 10.0), None);
            assert_eq!(estimate_remaining(0, 100, 0.0), None);
        }
    }
}
