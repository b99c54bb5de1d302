use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{GrindError, Result};

/// Where the candidate passwords come from: a single literal, or a
/// wordlist file with one candidate per line.
#[derive(Debug, Clone)]
pub enum CandidateSource {
    Single(String),
    Wordlist(PathBuf),
}

impl CandidateSource {
    /// Materialize the candidate list. Missing or empty sources are
    /// fatal setup errors, detected before any worker starts.
    pub fn load(&self) -> Result<Vec<String>> {
        match self {
            CandidateSource::Single(password) => {
                if password.is_empty() {
                    return Err(GrindError::EmptySource("empty password".to_string()));
                }
                Ok(vec![password.clone()])
            }
            CandidateSource::Wordlist(path) => {
                let candidates = load_wordlist(path)?;
                if candidates.is_empty() {
                    return Err(GrindError::EmptySource(path.display().to_string()));
                }
                info!(
                    "Loaded {} candidates from {}",
                    candidates.len(),
                    path.display()
                );
                Ok(candidates)
            }
        }
    }
}

/// Read a wordlist: trimmed lines, empties skipped, invalid UTF-8
/// tolerated (lossy), like the rest of the password tooling expects.
fn load_wordlist(path: &Path) -> Result<Vec<String>> {
    let file = File::open(path)
        .map_err(|_| GrindError::Wordlist(format!("not found: {}", path.display())))?;

    let reader = BufReader::new(file);
    let mut candidates = Vec::new();

    for line in reader.split(b'\n') {
        let line = line?;
        let text = String::from_utf8_lossy(&line);
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            candidates.push(trimmed.to_string());
        }
    }

    Ok(candidates)
}
