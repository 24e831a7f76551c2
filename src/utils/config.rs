//! Application configuration constants.
//! Tuning and defaults in one place.

use std::sync::OnceLock;
use std::time::Duration;

// ---- Package / paths (from CARGO_PKG_NAME, cached) ----

/// Package-derived paths: built once from `CARGO_PKG_NAME`, then cached.
pub struct PackagePaths {
    pkg_name: &'static str,
    config_filename: String,
    output_filename: String,
}

static PACKAGE_PATHS: OnceLock<PackagePaths> = OnceLock::new();

impl PackagePaths {
    /// Build and cache paths from `CARGO_PKG_NAME`. Called once on first use.
    pub fn get() -> &'static PackagePaths {
        PACKAGE_PATHS.get_or_init(|| {
            let pkg = env!("CARGO_PKG_NAME");
            PackagePaths {
                pkg_name: pkg,
                config_filename: format!(".{pkg}.toml"),
                output_filename: format!("{pkg}.csv"),
            }
        })
    }

    pub fn pkg_name(&self) -> &str {
        self.pkg_name
    }

    /// Settings file looked up in the working directory (e.g. `.uniqgen.toml`).
    pub fn config_filename(&self) -> &str {
        &self.config_filename
    }

    /// Default CSV output (e.g. `uniqgen.csv`).
    pub fn output_filename(&self) -> &str {
        &self.output_filename
    }
}

// ---- Pipeline ----

/// Defaults for [`PipelineOpts`](crate::PipelineOpts).
pub struct PipelineDefaults;

impl PipelineDefaults {
    pub const WORKERS: usize = 8;
    pub const BATCH_SIZE: usize = 1000;
    /// Auto channel capacity is this many batches per worker.
    pub const CHANNEL_BATCHES_PER_WORKER: usize = 2;
    pub const BATCH_WAIT: Duration = Duration::from_millis(200);
    /// Floor for consecutive already-seen candidates before a run counts as stalled.
    pub const STALL_CANDIDATES: usize = 10_000;
    /// The stall threshold also grows with the seen set: a source whose last unseen value has
    /// odds 1/M per draw misses it for this many * M draws with probability about e^-factor.
    pub const STALL_SEEN_FACTOR: usize = 20;
    pub const JOIN_TIMEOUT: Duration = Duration::from_secs(5);
    /// Poll interval while waiting for workers to exit.
    pub const JOIN_POLL: Duration = Duration::from_millis(10);
}

/// Unique entries generated when no count is given.
pub const DEFAULT_COUNT: usize = 1000;

/// CSV header row.
pub const DEFAULT_HEADER: &str = "name";

/// Seed for the built-in random sources.
pub const DEFAULT_SEED: u64 = 123_456_789;

// ---- Random 8.3 names ----

/// Alphabets and lengths for 8.3 filenames.
pub struct RandomNameConsts;

impl RandomNameConsts {
    pub const NAME_CHARS: &'static [u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789-_";
    pub const EXT_CHARS: &'static [u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
    pub const NAME_MIN_LEN: usize = 1;
    pub const NAME_MAX_LEN: usize = 8;
    /// Extensions are 0..=EXT_MAX_LEN chars; 0 means no dot.
    pub const EXT_MAX_LEN: usize = 3;
}
