use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{GrindError, Result};

/// Default separator patterns inserted between keywords: punctuation
/// plus single digits.
pub const DEFAULT_PATTERNS: [&str; 42] = [
    "", " ", "<", "!", ".", "_", "+", "(", "\"", "|", "¨", "/", "'", ">", "@", ")", "#", "~", "%",
    "`", "-", ";", ",", "&", "=", "*", "\\", "$", "é", "à", "è", ":", "0", "1", "2", "3", "4", "5",
    "6", "7", "8", "9",
];

/// Basic leetspeak substitutions
static LEET_BASIC: Lazy<HashMap<char, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ('a', "4"),
        ('e', "3"),
        ('i', "1"),
        ('o', "0"),
        ('s', "5"),
        ('t', "7"),
    ])
});

/// Extended leetspeak substitutions, applied on top of the basic map
static LEET_EXTENDED: Lazy<HashMap<char, &'static str>> = Lazy::new(|| {
    let mut map = LEET_BASIC.clone();
    map.extend([
        ('b', "8"),
        ('c', "("),
        ('g', "6"),
        ('h', "#"),
        ('l', "|"),
        ('z', "2"),
    ]);
    map
});

/// How keyword tuples are drawn per order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Permutation,
    Combination,
    Both,
}

/// Case transformation applied to every entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseMode {
    None,
    Lower,
    Upper,
    Title,
    Capitalize,
    Swap,
}

/// Numeric suffix range appended to every entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NumericSuffix {
    pub start: u32,
    pub end: u32,
    /// Zero-pad numbers to this width (0 disables padding)
    pub pad: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorOptions {
    pub mode: Mode,
    pub min_order: usize,
    /// None means up to the keyword count
    pub max_order: Option<usize>,
    /// None means DEFAULT_PATTERNS
    pub patterns: Option<Vec<String>>,
    pub case_mode: CaseMode,
    /// Emit a leetspeak variant alongside each entry
    pub leet: bool,
    /// 1 = basic map, 2 = extended map
    pub leet_level: u8,
    /// Emit a reversed variant alongside each entry
    pub reverse: bool,
    pub prepend: String,
    pub append: String,
    pub numeric_suffix: Option<NumericSuffix>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub skip_empty: bool,
    pub dedupe: bool,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            mode: Mode::Permutation,
            min_order: 1,
            max_order: None,
            patterns: None,
            case_mode: CaseMode::None,
            leet: false,
            leet_level: 1,
            reverse: false,
            prepend: String::new(),
            append: String::new(),
            numeric_suffix: None,
            min_length: None,
            max_length: None,
            skip_empty: true,
            dedupe: false,
        }
    }
}

/// Deterministic data-expansion pipeline turning a small keyword set
/// into decorated candidate passwords. No shared mutable state: the
/// whole expansion is a pure function of keywords and options.
pub struct WordlistGenerator;

impl WordlistGenerator {
    /// Expand keywords into the full candidate list.
    pub fn generate(keywords: &[String], opts: &GeneratorOptions) -> Result<Vec<String>> {
        if keywords.is_empty() {
            return Err(GrindError::Wordlist("no keywords loaded".to_string()));
        }
        if let Some(suffix) = &opts.numeric_suffix {
            if suffix.start > suffix.end {
                return Err(GrindError::Wordlist(format!(
                    "numeric suffix range is inverted: {}..{}",
                    suffix.start, suffix.end
                )));
            }
        }

        let default_patterns: Vec<String> =
            DEFAULT_PATTERNS.iter().map(|s| s.to_string()).collect();
        let patterns = opts.patterns.as_ref().unwrap_or(&default_patterns);

        let max_order = opts.max_order.unwrap_or(keywords.len()).min(keywords.len());
        let mut entries = Vec::new();

        for order in opts.min_order.max(1)..=max_order {
            if matches!(opts.mode, Mode::Permutation | Mode::Both) {
                for tuple in permutations(keywords, order) {
                    Self::join_with_patterns(&tuple, patterns, &mut entries);
                }
            }
            // Combinations of one keyword duplicate the permutations
            if matches!(opts.mode, Mode::Combination | Mode::Both) && order > 1 {
                for tuple in combinations(keywords, order) {
                    Self::join_with_patterns(&tuple, patterns, &mut entries);
                }
            }
        }

        Ok(Self::decorate(entries, opts))
    }

    /// Apply the transform pipeline: case, leet, reversal, affixes,
    /// numeric suffixes, length filter, dedupe. Order matches the
    /// generation contract: variants multiply, filters come last.
    fn decorate(mut entries: Vec<String>, opts: &GeneratorOptions) -> Vec<String> {
        if opts.case_mode != CaseMode::None {
            entries = entries
                .into_iter()
                .map(|e| apply_case(&e, opts.case_mode))
                .collect();
        }

        if opts.leet {
            let mut expanded = Vec::with_capacity(entries.len() * 2);
            for entry in entries {
                let leeted = apply_leet(&entry, opts.leet_level);
                let differs = leeted != entry;
                expanded.push(entry);
                if differs {
                    expanded.push(leeted);
                }
            }
            entries = expanded;
        }

        if opts.reverse {
            let mut expanded = Vec::with_capacity(entries.len() * 2);
            for entry in entries {
                let reversed: String = entry.chars().rev().collect();
                let differs = reversed != entry;
                expanded.push(entry);
                if differs {
                    expanded.push(reversed);
                }
            }
            entries = expanded;
        }

        if !opts.prepend.is_empty() {
            entries = entries
                .into_iter()
                .map(|e| format!("{}{}", opts.prepend, e))
                .collect();
        }

        if !opts.append.is_empty() {
            entries = entries
                .into_iter()
                .map(|e| format!("{}{}", e, opts.append))
                .collect();
        }

        if let Some(suffix) = &opts.numeric_suffix {
            let mut expanded =
                Vec::with_capacity(entries.len() * (suffix.end - suffix.start + 1) as usize);
            for entry in &entries {
                for num in suffix.start..=suffix.end {
                    if suffix.pad > 0 {
                        expanded.push(format!("{}{:0width$}", entry, num, width = suffix.pad));
                    } else {
                        expanded.push(format!("{}{}", entry, num));
                    }
                }
            }
            entries = expanded;
        }

        entries.retain(|e| {
            if opts.skip_empty && e.is_empty() {
                return false;
            }
            if let Some(min) = opts.min_length {
                if e.chars().count() < min {
                    return false;
                }
            }
            if let Some(max) = opts.max_length {
                if e.chars().count() > max {
                    return false;
                }
            }
            true
        });

        if opts.dedupe {
            let mut seen = HashSet::new();
            entries.retain(|e| seen.insert(e.clone()));
        }

        entries
    }

    /// Interleave a keyword tuple with every separator draw. Each tuple
    /// of n words takes max(n-1, 1) separators; a trailing empty
    /// separator keeps single words paired with one decoration.
    fn join_with_patterns(tuple: &[&String], patterns: &[String], out: &mut Vec<String>) {
        let needed = tuple.len().saturating_sub(1).max(1).min(patterns.len());
        for seps in combinations(patterns, needed) {
            let mut entry = String::new();
            for (i, word) in tuple.iter().enumerate() {
                entry.push_str(word);
                if i < needed {
                    entry.push_str(seps[i]);
                }
            }
            out.push(entry);
        }
    }

    /// Generate straight to a file, one entry per line. Returns the
    /// number of entries written.
    pub fn write_to_file(
        keywords: &[String],
        opts: &GeneratorOptions,
        path: &Path,
    ) -> Result<usize> {
        let entries = Self::generate(keywords, opts)?;

        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        for entry in &entries {
            writeln!(writer, "{}", entry)?;
        }
        writer.flush()?;

        info!("Wrote {} entries to {}", entries.len(), path.display());
        Ok(entries.len())
    }
}

fn apply_case(word: &str, mode: CaseMode) -> String {
    match mode {
        CaseMode::None => word.to_string(),
        CaseMode::Lower => word.to_lowercase(),
        CaseMode::Upper => word.to_uppercase(),
        CaseMode::Title => {
            // Uppercase every letter that follows a non-letter
            let mut prev_alpha = false;
            word.chars()
                .flat_map(|c| {
                    let out: Vec<char> = if c.is_alphabetic() && !prev_alpha {
                        c.to_uppercase().collect()
                    } else if c.is_alphabetic() {
                        c.to_lowercase().collect()
                    } else {
                        vec![c]
                    };
                    prev_alpha = c.is_alphabetic();
                    out
                })
                .collect()
        }
        CaseMode::Capitalize => {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        }
        CaseMode::Swap => word
            .chars()
            .flat_map(|c| {
                if c.is_uppercase() {
                    c.to_lowercase().collect::<Vec<char>>()
                } else {
                    c.to_uppercase().collect::<Vec<char>>()
                }
            })
            .collect(),
    }
}

/// Deterministic leetspeak substitution. Level 1 uses the basic map,
/// level 2 and above the extended one.
fn apply_leet(word: &str, level: u8) -> String {
    if level == 0 {
        return word.to_string();
    }
    let map = if level >= 2 { &*LEET_EXTENDED } else { &*LEET_BASIC };

    let mut result = String::with_capacity(word.len());
    for c in word.chars() {
        match map.get(&c.to_lowercase().next().unwrap_or(c)) {
            Some(replacement) => result.push_str(replacement),
            None => result.push(c),
        }
    }
    result
}

/// All k-permutations of `items`, in index order.
fn permutations<'a, T>(items: &'a [T], k: usize) -> Vec<Vec<&'a T>> {
    let mut out = Vec::new();
    let mut current = Vec::with_capacity(k);
    let mut used = vec![false; items.len()];
    permute_rec(items, k, &mut current, &mut used, &mut out);
    out
}

fn permute_rec<'a, T>(
    items: &'a [T],
    k: usize,
    current: &mut Vec<&'a T>,
    used: &mut [bool],
    out: &mut Vec<Vec<&'a T>>,
) {
    if current.len() == k {
        out.push(current.clone());
        return;
    }
    for i in 0..items.len() {
        if !used[i] {
            used[i] = true;
            current.push(&items[i]);
            permute_rec(items, k, current, used, out);
            current.pop();
            used[i] = false;
        }
    }
}

/// All k-combinations of `items`, in index order.
fn combinations<'a, T>(items: &'a [T], k: usize) -> Vec<Vec<&'a T>> {
    let mut out = Vec::new();
    let mut current = Vec::with_capacity(k);
    combine_rec(items, k, 0, &mut current, &mut out);
    out
}

fn combine_rec<'a, T>(
    items: &'a [T],
    k: usize,
    start: usize,
    current: &mut Vec<&'a T>,
    out: &mut Vec<Vec<&'a T>>,
) {
    if current.len() == k {
        out.push(current.clone());
        return;
    }
    for i in start..items.len() {
        current.push(&items[i]);
        combine_rec(items, k, i + 1, current, out);
        current.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keywords(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn plain_opts() -> GeneratorOptions {
        GeneratorOptions {
            patterns: Some(vec!["".to_string()]),
            ..GeneratorOptions::default()
        }
    }

    #[test]
    fn test_permutations_count() {
        let items = vec![1, 2, 3];
        assert_eq!(permutations(&items, 2).len(), 6);
        assert_eq!(permutations(&items, 3).len(), 6);
        assert_eq!(combinations(&items, 2).len(), 3);
    }

    #[test]
    fn test_generate_pairs_with_separator() {
        let opts = GeneratorOptions {
            min_order: 2,
            max_order: Some(2),
            patterns: Some(vec!["-".to_string()]),
            ..GeneratorOptions::default()
        };
        let entries = WordlistGenerator::generate(&keywords(&["foo", "bar"]), &opts).unwrap();
        assert_eq!(entries, vec!["foo-bar", "bar-foo"]);
    }

    #[test]
    fn test_single_word_keeps_one_decoration() {
        let opts = GeneratorOptions {
            max_order: Some(1),
            patterns: Some(vec!["!".to_string()]),
            ..GeneratorOptions::default()
        };
        let entries = WordlistGenerator::generate(&keywords(&["pw"]), &opts).unwrap();
        assert_eq!(entries, vec!["pw!"]);
    }

    #[test]
    fn test_combination_mode_skips_order_one_duplicates() {
        let opts = GeneratorOptions {
            mode: Mode::Both,
            max_order: Some(2),
            patterns: Some(vec!["".to_string()]),
            dedupe: true,
            ..GeneratorOptions::default()
        };
        let entries = WordlistGenerator::generate(&keywords(&["a", "b"]), &opts).unwrap();
        // Permutations: a, b, ab, ba; combination order 2 adds ab (deduped)
        assert_eq!(entries, vec!["a", "b", "ab", "ba"]);
    }

    #[test]
    fn test_case_modes() {
        assert_eq!(apply_case("hello world", CaseMode::Upper), "HELLO WORLD");
        assert_eq!(apply_case("HeLLo", CaseMode::Lower), "hello");
        assert_eq!(apply_case("hello world", CaseMode::Title), "Hello World");
        assert_eq!(apply_case("hELLO", CaseMode::Capitalize), "Hello");
        assert_eq!(apply_case("HeLLo", CaseMode::Swap), "hEllO");
    }

    #[test]
    fn test_leet_levels() {
        assert_eq!(apply_leet("password", 1), "p455w0rd");
        assert_eq!(apply_leet("chase", 2), "(#453");
        assert_eq!(apply_leet("password", 0), "password");
    }

    #[test]
    fn test_leet_variant_emitted_alongside_original() {
        let opts = GeneratorOptions {
            leet: true,
            leet_level: 1,
            ..plain_opts()
        };
        let entries = WordlistGenerator::generate(&keywords(&["sun"]), &opts).unwrap();
        assert_eq!(entries, vec!["sun", "5un"]);
    }

    #[test]
    fn test_reverse_variants() {
        let opts = GeneratorOptions {
            reverse: true,
            ..plain_opts()
        };
        let entries = WordlistGenerator::generate(&keywords(&["abc"]), &opts).unwrap();
        assert_eq!(entries, vec!["abc", "cba"]);
    }

    #[test]
    fn test_numeric_suffix_with_padding() {
        let opts = GeneratorOptions {
            numeric_suffix: Some(NumericSuffix {
                start: 9,
                end: 11,
                pad: 3,
            }),
            ..plain_opts()
        };
        let entries = WordlistGenerator::generate(&keywords(&["pw"]), &opts).unwrap();
        assert_eq!(entries, vec!["pw009", "pw010", "pw011"]);
    }

    #[test]
    fn test_inverted_suffix_range_rejected() {
        let opts = GeneratorOptions {
            numeric_suffix: Some(NumericSuffix {
                start: 5,
                end: 1,
                pad: 0,
            }),
            ..plain_opts()
        };
        assert!(WordlistGenerator::generate(&keywords(&["pw"]), &opts).is_err());
    }

    #[test]
    fn test_length_filter_and_affixes() {
        let opts = GeneratorOptions {
            prepend: "my".to_string(),
            append: "!".to_string(),
            min_length: Some(5),
            max_length: Some(6),
            ..plain_opts()
        };
        let entries =
            WordlistGenerator::generate(&keywords(&["ab", "longword"]), &opts).unwrap();
        assert_eq!(entries, vec!["myab!"]);
    }

    #[test]
    fn test_empty_keywords_rejected() {
        assert!(WordlistGenerator::generate(&[], &plain_opts()).is_err());
    }

    #[test]
    fn test_write_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wordlist.txt");
        let count =
            WordlistGenerator::write_to_file(&keywords(&["a", "b"]), &plain_opts(), &path)
                .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(count, content.lines().count());
        assert!(content.lines().any(|l| l == "a"));
    }
}
