use crossbeam_channel::Sender;
use log::{debug, warn};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::engine::progress::{ProgressReporter, Task};
use crate::source::{CandidateSource, SourceFactory};
use crate::utils::config::PackagePaths;
use crate::{Batch, Candidate, SourceError};

use super::context::{RunningGuard, StopSignal, WorkerStates};

/// Call `source` up to `batch_size` times. Stops early on the first error and returns what was
/// produced so far alongside it. `on_candidate` fires once per produced candidate.
pub fn generate_batch<S, F>(
    source: &mut S,
    batch_size: usize,
    mut on_candidate: F,
) -> (Vec<Candidate>, Option<SourceError>)
where
    S: CandidateSource + ?Sized,
    F: FnMut(),
{
    let mut candidates = Vec::with_capacity(batch_size);
    for _ in 0..batch_size {
        match source.next_candidate() {
            Ok(c) => {
                candidates.push(c);
                on_candidate();
            }
            Err(e) => return (candidates, Some(e)),
        }
    }
    (candidates, None)
}

/// Everything a worker thread needs besides its source.
pub struct WorkerContext {
    pub batch_size: usize,
    pub batch_tx: Sender<Batch>,
    pub signal: Arc<StopSignal>,
    pub states: Arc<WorkerStates>,
    pub progress: Arc<dyn ProgressReporter>,
}

/// Single worker: produce batches until the stop signal trips, the channel closes, or the source fails.
/// The stop signal is only consulted between batches.
fn worker_loop<S: CandidateSource>(index: usize, mut source: S, ctx: WorkerContext) {
    let _running = RunningGuard::new(Arc::clone(&ctx.states), index);
    let task = Task::Worker(index);
    let mut sent = 0_usize;

    while !ctx.signal.should_stop() {
        ctx.progress.start_task(task, ctx.batch_size);
        let (candidates, failure) =
            generate_batch(&mut source, ctx.batch_size, || ctx.progress.advance(task));
        ctx.progress.finish_task(task);

        if !candidates.is_empty() {
            let batch = Batch {
                worker: index,
                candidates,
            };
            if ctx.batch_tx.send(batch).is_err() {
                debug!("Worker-{}: channel closed", index + 1);
                break;
            }
            sent += 1;
        }
        match failure {
            None => {}
            Some(SourceError::Exhausted) => {
                debug!("Worker-{}: source exhausted", index + 1);
                break;
            }
            Some(e) => {
                warn!("Worker-{} stopping: {}", index + 1, e);
                break;
            }
        }
    }
    debug!("Worker-{} finished after {} batches", index + 1, sent);
}

/// Build one source per worker and spawn the worker threads. A worker whose source cannot be
/// built, or whose thread cannot be spawned, is marked stopped and skipped; the rest still run.
/// Returns the handles of the workers that started.
pub fn spawn_workers<F: SourceFactory>(
    factory: &F,
    workers: usize,
    ctx: &WorkerContext,
) -> Vec<JoinHandle<()>> {
    let pkg = PackagePaths::get().pkg_name();
    (0..workers)
        .filter_map(|i| {
            let source = match factory.build(i, workers) {
                Ok(s) => s,
                Err(e) => {
                    warn!("Worker-{} not started: {}", i + 1, e);
                    ctx.states.mark_stopped(i);
                    return None;
                }
            };
            let worker_ctx = WorkerContext {
                batch_size: ctx.batch_size,
                batch_tx: ctx.batch_tx.clone(),
                signal: Arc::clone(&ctx.signal),
                states: Arc::clone(&ctx.states),
                progress: Arc::clone(&ctx.progress),
            };
            match thread::Builder::new()
                .name(format!("{pkg}-worker-{}", i + 1))
                .spawn(move || worker_loop(i, source, worker_ctx))
            {
                Ok(handle) => Some(handle),
                Err(e) => {
                    warn!("Worker-{} thread spawn failed: {}", i + 1, e);
                    ctx.states.mark_stopped(i);
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Countdown(usize);

    impl CandidateSource for Countdown {
        fn next_candidate(&mut self) -> Result<Candidate, SourceError> {
            if self.0 == 0 {
                return Err(SourceError::Exhausted);
            }
            self.0 -= 1;
            Ok(self.0.to_string())
        }
    }

    #[test]
    fn test_generate_batch_full() {
        let mut src = Countdown(10);
        let mut calls = 0;
        let (batch, err) = generate_batch(&mut src, 4, || calls += 1);
        assert_eq!(batch, vec!["9", "8", "7", "6"]);
        assert!(err.is_none());
        assert_eq!(calls, 4);
    }

    #[test]
    fn test_generate_batch_keeps_partial_on_error() {
        let mut src = Countdown(2);
        let (batch, err) = generate_batch(&mut src, 5, || {});
        assert_eq!(batch, vec!["1", "0"]);
        assert!(matches!(err, Some(SourceError::Exhausted)));
    }
}
