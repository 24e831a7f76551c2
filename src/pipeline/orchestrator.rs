use log::{debug, warn};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::engine::progress::ProgressReporter;
use crate::pipeline::{self, CollectParams, Collector, WorkerContext};
use crate::sink::Sink;
use crate::source::SourceFactory;
use crate::utils::config::PipelineDefaults;
use crate::{Outcome, PipelineError, PipelineOpts, Status, StopReason};

/// How a finished run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunEnd {
    Success,
    Partial,
    Error,
}

/// Supervisor lifecycle. Moves strictly forward; a supervisor runs once.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SupervisorState {
    Idle,
    Running,
    Draining,
    Done(RunEnd),
}

/// Starts the worker pool, runs the collector on the calling thread and shuts everything down.
pub struct Supervisor<'a, F: SourceFactory> {
    opts: &'a PipelineOpts,
    factory: &'a F,
    progress: Arc<dyn ProgressReporter>,
    state: SupervisorState,
}

impl<'a, F: SourceFactory> Supervisor<'a, F> {
    pub fn new(opts: &'a PipelineOpts, factory: &'a F, progress: Arc<dyn ProgressReporter>) -> Self {
        Self {
            opts,
            factory,
            progress,
            state: SupervisorState::Idle,
        }
    }

    pub fn state(&self) -> SupervisorState {
        self.state
    }

    fn transition(&mut self, next: SupervisorState) {
        debug!("supervisor: {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    /// Run the pipeline into `sink`. Validation errors leave the supervisor `Idle`.
    pub fn run<S: Sink + ?Sized>(&mut self, sink: &mut S) -> Result<Outcome, PipelineError> {
        if self.state != SupervisorState::Idle {
            return Err(PipelineError::AlreadyRan);
        }
        self.opts.validate()?;
        let opts = self.opts;

        let channels = pipeline::create_pipeline_channels(opts);
        debug!(
            "Starting {} workers, batch {}, channel cap {:?}, target {}",
            opts.workers,
            opts.batch_size,
            opts.channel_cap(),
            opts.target
        );
        self.transition(SupervisorState::Running);

        let ctx = WorkerContext {
            batch_size: opts.batch_size,
            batch_tx: channels.batch_tx,
            signal: Arc::clone(&channels.signal),
            states: Arc::clone(&channels.states),
            progress: Arc::clone(&self.progress),
        };
        let worker_handles = pipeline::spawn_workers(self.factory, opts.workers, &ctx);
        // Dropping the last supervisor-held sender lets the channel close once every worker exits.
        drop(ctx);

        let params = CollectParams {
            batch_wait: opts.batch_wait,
            stall_candidates: opts.stall_candidates,
            signal: &channels.signal,
            states: &channels.states,
            cancel: opts.cancel.as_deref(),
            progress: self.progress.as_ref(),
        };
        let collected = Collector::new(&mut *sink, opts.target).run(&channels.batch_rx, &params);

        self.transition(SupervisorState::Draining);
        channels.signal.request_stop();
        // Closing the receiver stops intake and unblocks any worker waiting on a full channel.
        drop(channels.batch_rx);
        let detached = shutdown_workers(worker_handles, opts.join_timeout);
        if detached > 0 {
            warn!(
                "{} workers still busy after {:?}; detached",
                detached, opts.join_timeout
            );
        }
        let flushed = sink.flush();

        let collected = match (collected, flushed) {
            (Ok(c), Ok(())) => c,
            (Err(e), _) => {
                self.transition(SupervisorState::Done(RunEnd::Error));
                return Err(e);
            }
            (Ok(c), Err(source)) => {
                self.transition(SupervisorState::Done(RunEnd::Error));
                return Err(PipelineError::Sink {
                    accepted: c.accepted,
                    source,
                });
            }
        };

        let status = if collected.accepted == opts.target {
            Status::Success
        } else {
            Status::Partial
        };
        self.transition(SupervisorState::Done(match status {
            Status::Success => RunEnd::Success,
            Status::Partial => RunEnd::Partial,
        }));
        if status == Status::Partial {
            warn!(
                "Generated only {} names out of {} ({})",
                collected.accepted,
                opts.target,
                describe_reason(collected.reason)
            );
        }
        Ok(Outcome {
            accepted: collected.accepted,
            target: opts.target,
            status,
            reason: collected.reason,
            stats: collected.stats,
        })
    }
}

pub fn describe_reason(reason: StopReason) -> &'static str {
    match reason {
        StopReason::TargetReached => "target reached",
        StopReason::Exhausted => "all workers finished",
        StopReason::Stalled => "no new entries arriving",
        StopReason::Cancelled => "cancelled",
    }
}

/// Join worker threads, waiting at most `timeout` overall. Returns how many were still running
/// and got detached.
pub fn shutdown_workers(worker_handles: Vec<JoinHandle<()>>, timeout: Duration) -> usize {
    let deadline = Instant::now() + timeout;
    let mut pending = worker_handles;
    loop {
        let (finished, running): (Vec<_>, Vec<_>) =
            pending.into_iter().partition(|h| h.is_finished());
        for h in finished {
            if h.join().is_err() {
                warn!("worker thread panicked");
            }
        }
        pending = running;
        if pending.is_empty() || Instant::now() >= deadline {
            break;
        }
        thread::sleep(PipelineDefaults::JOIN_POLL);
    }
    pending.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shutdown_workers_joins_finished() {
        let handles = (0..3).map(|_| thread::spawn(|| {})).collect();
        assert_eq!(shutdown_workers(handles, Duration::from_secs(1)), 0);
    }

    #[test]
    fn test_shutdown_workers_detaches_stragglers() {
        let (tx, rx) = crossbeam_channel::bounded::<()>(0);
        let slow = thread::spawn(move || {
            let _ = rx.recv();
        });
        assert_eq!(shutdown_workers(vec![slow], Duration::from_millis(30)), 1);
        drop(tx);
    }
}
