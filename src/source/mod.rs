//! Candidate sources: the capability workers call to produce one candidate at a time.
//!
//! The pipeline treats a source as opaque. It may be slow, non-deterministic and may repeat
//! itself; uniqueness is enforced downstream by the collector.

pub mod rander;
pub mod wordlist;

pub use rander::{RandomNameFactory, RandomNameSource, generate_83_name};
pub use wordlist::{WordListFactory, WordListSource, WordMode, load_word_list};

use crate::{Candidate, SourceError};

/// Produces one candidate per call.
pub trait CandidateSource: Send {
    fn next_candidate(&mut self) -> Result<Candidate, SourceError>;
}

impl<F> CandidateSource for F
where
    F: FnMut() -> Result<Candidate, SourceError> + Send,
{
    fn next_candidate(&mut self) -> Result<Candidate, SourceError> {
        self()
    }
}

/// Builds one [`CandidateSource`] per worker at spawn time.
///
/// Workers never share an instance, so a stateful source needs no locking of its own. Shared
/// read-only state (a word list, model weights) should sit behind an `Arc` inside the factory.
pub trait SourceFactory {
    type Source: CandidateSource + 'static;

    /// Build the source for worker `worker` of `workers`. An error keeps only that worker from starting.
    fn build(&self, worker: usize, workers: usize) -> Result<Self::Source, SourceError>;
}

/// Any `Fn(worker) -> source` closure is a factory.
impl<F, S> SourceFactory for F
where
    F: Fn(usize) -> S,
    S: CandidateSource + 'static,
{
    type Source = S;

    fn build(&self, worker: usize, _workers: usize) -> Result<S, SourceError> {
        Ok(self(worker))
    }
}
