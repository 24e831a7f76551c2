//! Typed errors for the generation pipeline. CLI glue wraps these in `anyhow`.

use std::io;
use thiserror::Error;

/// Failure of one candidate-source call. Only the worker that owns the source stops.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The source has nothing left to give (e.g. a word list walked to its end).
    #[error("source exhausted")]
    Exhausted,
    #[error("source I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("source failed: {0}")]
    Failed(String),
}

/// Errors that end a run. An under-delivered run is not an error; see [`crate::Status::Partial`].
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid pipeline config: {0}")]
    InvalidConfig(String),
    /// Appending to or flushing the sink failed. Entries past `accepted` were not written.
    #[error("sink write failed after {accepted} accepted entries")]
    Sink {
        accepted: usize,
        #[source]
        source: io::Error,
    },
    #[error("supervisor has already run; build a new one for another run")]
    AlreadyRan,
}
