//! Load `.uniqgen.toml` (CLI only). Lib callers pass [`PipelineOpts`](crate::PipelineOpts) directly.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::source::WordMode;
use crate::{ChannelCapacity, Opts, SourceKind};

#[derive(Debug, Default, Deserialize)]
pub struct UniqgenToml {
    #[serde(default)]
    settings: GenerateSection,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateSection {
    count: Option<usize>,
    output: Option<String>,
    header: Option<String>,
    threads: Option<usize>,
    batch: Option<usize>,
    channel_cap: Option<usize>,
    unbounded: Option<bool>,
    stall_candidates: Option<usize>,
    batch_wait_ms: Option<u64>,
    join_timeout_ms: Option<u64>,
    source: Option<SourceKind>,
    seed: Option<u64>,
    words: Option<String>,
    mode: Option<WordMode>,
    skip_header: Option<bool>,
    column: Option<usize>,
    upper: Option<bool>,
    progress: Option<bool>,
    strict: Option<bool>,
}

/// Load settings from `path`. Returns None if the file is missing or unreadable; parse errors are logged.
pub fn load_uniqgen_toml(path: &Path) -> Option<UniqgenToml> {
    let s = std::fs::read_to_string(path).ok()?;
    toml::from_str(&s)
        .map_err(|e| log::warn!("{}: {}", path.display(), e))
        .ok()
}

/// Overwrite opts field from file when present.
macro_rules! apply_file_opt {
    ($idx:expr, $opts:expr, $idx_field:ident => $($opts_field:ident).+) => {
        if let Some(v) = $idx.$idx_field.clone() {
            $opts.$($opts_field).+ = v;
        }
    };
}

/// Apply file config to opts (only fields present in the file). Call before applying CLI.
pub fn apply_file_to_opts(file: &UniqgenToml, opts: &mut Opts) {
    let idx = &file.settings;
    apply_file_opt!(idx, opts, count => pipeline.target);
    if let Some(ref p) = idx.output {
        opts.output = PathBuf::from(p);
    }
    apply_file_opt!(idx, opts, header => header);
    apply_file_opt!(idx, opts, threads => pipeline.workers);
    apply_file_opt!(idx, opts, batch => pipeline.batch_size);
    apply_file_opt!(idx, opts, stall_candidates => pipeline.stall_candidates);
    if let Some(cap) = idx.channel_cap {
        opts.pipeline.channel = ChannelCapacity::Bounded(cap);
    }
    if idx.unbounded == Some(true) {
        opts.pipeline.channel = ChannelCapacity::Unbounded;
    }
    if let Some(ms) = idx.batch_wait_ms {
        opts.pipeline.batch_wait = Duration::from_millis(ms);
    }
    if let Some(ms) = idx.join_timeout_ms {
        opts.pipeline.join_timeout = Duration::from_millis(ms);
    }
    apply_file_opt!(idx, opts, source => source);
    apply_file_opt!(idx, opts, seed => seed);
    if let Some(ref p) = idx.words {
        opts.words = Some(PathBuf::from(p));
    }
    apply_file_opt!(idx, opts, mode => word_mode);
    apply_file_opt!(idx, opts, skip_header => skip_header);
    apply_file_opt!(idx, opts, column => column);
    apply_file_opt!(idx, opts, upper => uppercase);
    apply_file_opt!(idx, opts, progress => progress);
    apply_file_opt!(idx, opts, strict => strict);
}
