//! Public and internal types for the uniqgen API and pipeline.

use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use crate::PipelineError;
use crate::source::WordMode;
use crate::utils::config::{DEFAULT_COUNT, DEFAULT_HEADER, DEFAULT_SEED, PackagePaths, PipelineDefaults};

/// A generated value that has not been deduplicated yet.
pub type Candidate = String;

/// Candidates produced by one worker pass, in generation order.
#[derive(Clone, Debug, Default)]
pub struct Batch {
    /// Index of the producing worker. Diagnostics only.
    pub worker: usize,
    pub candidates: Vec<Candidate>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

/// Whether the sink received the full target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    Success,
    /// Fewer than `target` unique entries were written. Reported, not an error.
    Partial,
}

/// Why the collector stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    TargetReached,
    /// Every worker stopped and no batch is left in the channel.
    Exhausted,
    /// Too many consecutive candidates were repeats while workers were still producing.
    Stalled,
    /// The caller's cancel flag was raised.
    Cancelled,
}

/// Counters kept by the collector while draining batches.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CollectStats {
    pub batches: usize,
    /// Candidates received in batches (accepted + duplicates + surplus).
    pub received: usize,
    /// Candidates discarded because they were already accepted.
    pub duplicates: usize,
    /// Candidates discarded because the target had already been reached.
    pub surplus: usize,
}

/// Result of a finished run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Outcome {
    pub accepted: usize,
    pub target: usize,
    pub status: Status,
    pub reason: StopReason,
    pub stats: CollectStats,
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }

    /// How many entries short of the target the run ended.
    pub fn shortfall(&self) -> usize {
        self.target.saturating_sub(self.accepted)
    }
}

/// Capacity of the batch channel between workers and collector.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ChannelCapacity {
    /// `PipelineDefaults::CHANNEL_BATCHES_PER_WORKER` batches per worker.
    #[default]
    Auto,
    /// Exactly this many batches; producers block when full.
    Bounded(usize),
    /// Producers never block. Memory grows if the collector stalls.
    Unbounded,
}

/// Lib options for [`run`](crate::run). `target` has no usable default and must be set.
///
/// ```ignore
/// let opts = PipelineOpts { target: 10_000, workers: 4, ..Default::default() };
/// ```
#[derive(Clone, Debug)]
pub struct PipelineOpts {
    /// Exact number of unique entries wanted in the sink. Must be > 0.
    pub target: usize,
    /// Worker thread count.
    pub workers: usize,
    /// Candidates per batch. Larger batches mean less channel traffic but more waste near the target.
    pub batch_size: usize,
    pub channel: ChannelCapacity,
    /// How long the collector waits for a batch before re-checking liveness.
    pub batch_wait: Duration,
    /// Consecutive already-seen candidates before the run is declared stalled. The effective
    /// threshold is at least `STALL_SEEN_FACTOR` times the accepted count. 0 disables.
    pub stall_candidates: usize,
    /// Upper bound on waiting for workers to exit during drain. Stragglers are detached.
    pub join_timeout: Duration,
    /// Raise to stop the run early; entries written so far are kept.
    pub cancel: Option<Arc<AtomicBool>>,
}

impl Default for PipelineOpts {
    fn default() -> Self {
        Self {
            target: 0,
            workers: PipelineDefaults::WORKERS,
            batch_size: PipelineDefaults::BATCH_SIZE,
            channel: ChannelCapacity::Auto,
            batch_wait: PipelineDefaults::BATCH_WAIT,
            stall_candidates: PipelineDefaults::STALL_CANDIDATES,
            join_timeout: PipelineDefaults::JOIN_TIMEOUT,
            cancel: None,
        }
    }
}

impl PipelineOpts {
    pub fn new(target: usize) -> Self {
        Self {
            target,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        let invalid = |msg: &str| Err(PipelineError::InvalidConfig(msg.to_string()));
        if self.target == 0 {
            return invalid("target must be greater than 0");
        }
        if self.workers == 0 {
            return invalid("worker count must be greater than 0");
        }
        if self.batch_size == 0 {
            return invalid("batch size must be greater than 0");
        }
        if self.channel == ChannelCapacity::Bounded(0) {
            return invalid("bounded channel capacity must be greater than 0");
        }
        if self.batch_wait.is_zero() {
            return invalid("batch wait must be non-zero");
        }
        Ok(())
    }

    /// Channel capacity in batches, `None` when unbounded.
    pub fn channel_cap(&self) -> Option<usize> {
        match self.channel {
            ChannelCapacity::Auto => {
                Some(self.workers.max(1) * PipelineDefaults::CHANNEL_BATCHES_PER_WORKER)
            }
            ChannelCapacity::Bounded(n) => Some(n),
            ChannelCapacity::Unbounded => None,
        }
    }
}

/// Built-in candidate sources selectable from the CLI.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Random 8.3 filenames.
    #[default]
    Random,
    /// Entries drawn from a word list file.
    List,
}

/// Full options (CLI). Use [`PipelineOpts`] for lib.
#[derive(Clone, Debug)]
pub struct Opts {
    pub pipeline: PipelineOpts,
    /// Final CSV path. Written through a temp file and renamed at the end.
    pub output: PathBuf,
    /// CSV header row.
    pub header: String,
    pub source: SourceKind,
    pub seed: u64,
    /// Word list for [`SourceKind::List`].
    pub words: Option<PathBuf>,
    pub word_mode: WordMode,
    /// Treat the first row of the word list as a header.
    pub skip_header: bool,
    /// Zero-based word-list column to read.
    pub column: usize,
    /// Uppercase word-list entries.
    pub uppercase: bool,
    pub verbose: bool,
    /// Show progress bars.
    pub progress: bool,
    /// Exit with an error when fewer than `target` entries were written.
    pub strict: bool,
}

impl Default for Opts {
    fn default() -> Self {
        Self {
            pipeline: PipelineOpts::new(DEFAULT_COUNT),
            output: PathBuf::from(PackagePaths::get().output_filename()),
            header: DEFAULT_HEADER.to_string(),
            source: SourceKind::default(),
            seed: DEFAULT_SEED,
            words: None,
            word_mode: WordMode::default(),
            skip_header: false,
            column: 0,
            uppercase: false,
            verbose: false,
            progress: false,
            strict: false,
        }
    }
}
