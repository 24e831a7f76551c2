//! uniqgen: concurrent deduplicating generation of unique synthetic names.
//!
//! A pool of workers calls a [`CandidateSource`](source::CandidateSource) to fill batches, a
//! single collector drops repeats and writes exactly `target` unique entries to a [`Sink`](sink::Sink).

pub mod engine;
pub mod error;
pub mod pipeline;
pub mod sink;
pub mod source;
pub mod types;
pub mod utils;

/// Re-export types for API
pub use error::{PipelineError, SourceError};
pub use types::*;

use log::debug;
use std::sync::Arc;

use engine::progress::{NoProgress, ProgressReporter};
use pipeline::Supervisor;
use sink::Sink;
use source::SourceFactory;

/// Result alias for the file-facing and CLI parts of the API (word lists, output files)
pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// Single entry point: run the pipeline with `opts`, one source per worker from `factory`,
/// writing accepted entries to `sink` in acceptance order.
///
/// Returns [`Status::Partial`] (not an error) when the sources ran dry before `opts.target`.
/// A sink failure is an error.
pub fn run<F, S>(
    opts: &PipelineOpts,
    factory: &F,
    sink: &mut S,
    progress: Arc<dyn ProgressReporter>,
) -> std::result::Result<Outcome, PipelineError>
where
    F: SourceFactory,
    S: Sink + ?Sized,
{
    debug!(
        "{} CONFIG:{:#?}",
        env!("CARGO_PKG_NAME").to_string().to_uppercase(),
        opts
    );
    Supervisor::new(opts, factory, progress).run(sink)
}

/// Collect into memory without progress reporting. Returns `(entries, outcome)`.
///
/// ```ignore
/// let opts = uniqgen::PipelineOpts { target: 500, workers: 4, ..Default::default() };
/// let (names, outcome) = uniqgen::generate(&opts, &uniqgen::source::RandomNameFactory::new(7))?;
/// assert_eq!(names.len(), outcome.accepted);
/// ```
pub fn generate<F: SourceFactory>(
    opts: &PipelineOpts,
    factory: &F,
) -> std::result::Result<(Vec<String>, Outcome), PipelineError> {
    let mut entries: Vec<String> = Vec::new();
    let outcome = run(opts, factory, &mut entries, Arc::new(NoProgress))?;
    Ok((entries, outcome))
}
