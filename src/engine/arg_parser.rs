use clap::Parser;
use std::path::PathBuf;

use crate::SourceKind;
use crate::source::WordMode;

/// Concurrent deduplicating name generator.
#[derive(Clone, Parser)]
#[command(name = "uniqgen")]
#[command(about = "Generate exactly N unique names with a pool of workers and write them to CSV.")]
pub struct Cli {
    /// Number of unique names to generate. Default: 1000.
    #[arg(long, short = 'n', value_parser = clap::value_parser!(usize))]
    pub count: Option<usize>,

    /// Output CSV path. Default: `uniqgen.csv` in the current directory.
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// CSV header row. Default: `name`.
    #[arg(long)]
    pub header: Option<String>,

    /// Worker threads. Default: 8.
    #[arg(long, short = 't', value_parser = clap::value_parser!(usize))]
    pub threads: Option<usize>,

    /// Candidates per batch. Default: 1000.
    #[arg(long, short = 'b', value_parser = clap::value_parser!(usize))]
    pub batch: Option<usize>,

    /// Batch channel capacity (in batches). Default: 2 per worker.
    #[arg(long, value_parser = clap::value_parser!(usize))]
    pub channel_cap: Option<usize>,

    /// Never block workers on a full channel.
    #[arg(long, num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub unbounded: Option<bool>,

    /// Stop after this many consecutive repeated candidates (at least 20x the names accepted so far).
    /// 0 disables. Default: 10000.
    #[arg(long, value_parser = clap::value_parser!(usize))]
    pub stall_candidates: Option<usize>,

    /// Candidate source.
    #[arg(long, short = 's', value_enum)]
    pub source: Option<SourceKind>,

    /// Seed for random sources.
    #[arg(long, value_parser = clap::value_parser!(u64))]
    pub seed: Option<u64>,

    /// Word list for `--source list` (CSV or one entry per line).
    #[arg(long, short = 'w')]
    pub words: Option<PathBuf>,

    /// How workers walk the word list.
    #[arg(long, short = 'm', value_enum)]
    pub mode: Option<WordMode>,

    /// Treat the first row of the word list as a CSV header.
    #[arg(long, num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub skip_header: Option<bool>,

    /// Zero-based column of the word list to read. Default: 0.
    #[arg(long, value_parser = clap::value_parser!(usize))]
    pub column: Option<usize>,

    /// Uppercase word-list entries.
    #[arg(long, short = 'u', num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub upper: Option<bool>,

    /// Show progress bars.
    #[arg(long, short = 'p', num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub progress: Option<bool>,

    /// Fail when fewer than the requested number of names could be generated.
    #[arg(long, num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub strict: Option<bool>,

    /// Verbose output.
    #[arg(long, short = 'v', num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub verbose: Option<bool>,

    /// Settings file. Default: `.uniqgen.toml` in the current directory.
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,
}
