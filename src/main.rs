use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use rargrind::candidates::CandidateSource;
use rargrind::config::Config;
use rargrind::dispatcher::{default_workers, Dispatcher, RunOutcome};
use rargrind::report::ConsoleReporter;
use rargrind::utils::format_number;
use rargrind::verifier::unrar_verifier;
use rargrind::wordlist::{CaseMode, GeneratorOptions, Mode, NumericSuffix, WordlistGenerator};

/// RAR password recovery: parallel candidate testing + wordlist generation
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file path
    #[arg(short, long)]
    config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Test passwords against a RAR archive
    Test {
        /// RAR archive to test
        #[arg(short = 'f', long)]
        file: PathBuf,

        /// Single password to test
        #[arg(short, long, conflicts_with = "wordlist")]
        password: Option<String>,

        /// Wordlist file containing passwords to test
        #[arg(short, long)]
        wordlist: Option<PathBuf>,

        /// Number of parallel workers
        #[arg(short = 't', long)]
        threads: Option<usize>,
    },

    /// Generate a combinatorial wordlist from keywords
    Gen {
        /// File containing keywords (one per line)
        #[arg(short, long, default_value = "keywords.txt")]
        keywords: PathBuf,

        /// Output wordlist file
        #[arg(short, long, default_value = "my_wordlist.txt")]
        output: PathBuf,

        /// Custom separator patterns, comma separated
        #[arg(short, long)]
        patterns: Option<String>,

        /// Generation mode
        #[arg(long, value_enum, default_value = "permutation")]
        mode: GenMode,

        /// Minimum combination order
        #[arg(long, default_value_t = 1)]
        min_order: usize,

        /// Maximum combination order (default: keyword count)
        #[arg(long)]
        max_order: Option<usize>,

        /// Case transformation
        #[arg(long, value_enum, default_value = "none")]
        case_mode: GenCaseMode,

        /// Emit leetspeak variants
        #[arg(long)]
        leet: bool,

        /// Leetspeak level: 1=basic, 2=extended
        #[arg(long, default_value_t = 1)]
        leet_level: u8,

        /// Emit reversed variants
        #[arg(long)]
        reverse: bool,

        /// String to prepend to each entry
        #[arg(long, default_value = "")]
        prepend: String,

        /// String to append to each entry
        #[arg(long, default_value = "")]
        append: String,

        /// Add a numeric suffix to each entry
        #[arg(long)]
        add_num: bool,

        /// Starting number for the numeric suffix
        #[arg(long, default_value_t = 0)]
        num_start: u32,

        /// Ending number for the numeric suffix
        #[arg(long, default_value_t = 9999)]
        num_end: u32,

        /// Zero-pad numbers to this width
        #[arg(long, default_value_t = 0)]
        num_pad: usize,

        /// Minimum entry length
        #[arg(long)]
        min_length: Option<usize>,

        /// Maximum entry length
        #[arg(long)]
        max_length: Option<usize>,

        /// Remove duplicate entries
        #[arg(long)]
        dedupe: bool,
    },
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum GenMode {
    Permutation,
    Combination,
    Both,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum GenCaseMode {
    None,
    Lower,
    Upper,
    Title,
    Capitalize,
    Swap,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.verbose);

    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    match args.command {
        Command::Test {
            file,
            password,
            wordlist,
            threads,
        } => run_test(&config, file, password, wordlist, threads).await,
        Command::Gen {
            keywords,
            output,
            patterns,
            mode,
            min_order,
            max_order,
            case_mode,
            leet,
            leet_level,
            reverse,
            prepend,
            append,
            add_num,
            num_start,
            num_end,
            num_pad,
            min_length,
            max_length,
            dedupe,
        } => {
            let opts = GeneratorOptions {
                mode: match mode {
                    GenMode::Permutation => Mode::Permutation,
                    GenMode::Combination => Mode::Combination,
                    GenMode::Both => Mode::Both,
                },
                min_order,
                max_order,
                patterns: patterns.map(|p| p.split(',').map(|s| s.to_string()).collect()),
                case_mode: match case_mode {
                    GenCaseMode::None => CaseMode::None,
                    GenCaseMode::Lower => CaseMode::Lower,
                    GenCaseMode::Upper => CaseMode::Upper,
                    GenCaseMode::Title => CaseMode::Title,
                    GenCaseMode::Capitalize => CaseMode::Capitalize,
                    GenCaseMode::Swap => CaseMode::Swap,
                },
                leet,
                leet_level,
                reverse,
                prepend,
                append,
                numeric_suffix: add_num.then_some(NumericSuffix {
                    start: num_start,
                    end: num_end,
                    pad: num_pad,
                }),
                min_length,
                max_length,
                skip_empty: true,
                dedupe,
            };
            run_gen(&keywords, &output, &opts)
        }
    }
}

async fn run_test(
    config: &Config,
    archive: PathBuf,
    password: Option<String>,
    wordlist: Option<PathBuf>,
    threads: Option<usize>,
) -> Result<()> {
    if !archive.exists() {
        anyhow::bail!("RAR file not found: {}", archive.display());
    }

    let source = match (password, wordlist) {
        (Some(pw), None) => CandidateSource::Single(pw),
        (None, Some(path)) => CandidateSource::Wordlist(path),
        _ => anyhow::bail!("exactly one of --password or --wordlist is required"),
    };
    let candidates = source.load()?;

    let workers = threads
        .or(config.attack.workers)
        .unwrap_or_else(default_workers);

    info!("Testing {} passwords", format_number(candidates.len() as u64));
    info!("Against RAR file: {}", archive.display());
    info!("Using {} parallel workers", workers);

    let verifier = Arc::new(unrar_verifier(&config.tool.unrar_bin, config.timeout()));
    let dispatcher = Dispatcher::new(verifier, workers, config.attack.progress_every);
    let reporter = ConsoleReporter::new(candidates.len() as u64);

    let result = dispatcher.run(candidates, archive.clone(), &reporter).await;

    if let RunOutcome::Found { candidate, method } = &result {
        save_hit(&config.attack.hit_file, &archive, candidate, method.as_str())?;
    }

    // Found or exhausted, either way exit zero: the result is reported
    // via output, not the exit code.
    Ok(())
}

fn run_gen(keywords_path: &Path, output: &Path, opts: &GeneratorOptions) -> Result<()> {
    let keywords = CandidateSource::Wordlist(keywords_path.to_path_buf())
        .load()
        .context("failed to load keywords")?;

    info!("Loaded {} keywords from {}", keywords.len(), keywords_path.display());

    let count = WordlistGenerator::write_to_file(&keywords, opts, output)?;

    info!(
        "Wordlist generated: {} entries written to {}",
        format_number(count as u64),
        output.display()
    );
    Ok(())
}

/// Append a found-password record so a long run's result survives the
/// terminal scrollback.
fn save_hit(hit_file: &str, archive: &Path, candidate: &str, method: &str) -> Result<()> {
    let hit = serde_json::json!({
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "archive": archive.display().to_string(),
        "password": candidate,
        "method": method,
    });

    if let Some(parent) = Path::new(hit_file).parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(hit_file)?;

    writeln!(file, "{}", serde_json::to_string(&hit)?)?;

    Ok(())
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };

    tracing_subscriber::fmt()
        .with_env_filter(level)
        .with_target(false)
        .init();
}
