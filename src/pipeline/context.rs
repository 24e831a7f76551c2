//! Pipeline context: the batch channel and the small set of atomics shared across threads.
//!
//! Workers only ever read a point-in-time accepted count; SeenSet stays private to the collector.

use crossbeam_channel::{Receiver, Sender, bounded, unbounded};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::{Batch, PipelineOpts};

/// Stop signal read by workers at batch boundaries: accepted count published by the collector
/// plus an explicit stop flag raised by the supervisor.
#[derive(Debug)]
pub struct StopSignal {
    target: usize,
    accepted: AtomicUsize,
    stop: AtomicBool,
}

impl StopSignal {
    pub fn new(target: usize) -> Self {
        Self {
            target,
            accepted: AtomicUsize::new(0),
            stop: AtomicBool::new(false),
        }
    }

    pub fn accepted(&self) -> usize {
        self.accepted.load(Ordering::Acquire)
    }

    /// Collector only. The count is monotonic.
    pub fn publish(&self, accepted: usize) {
        self.accepted.store(accepted, Ordering::Release);
    }

    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::Release);
    }

    pub fn should_stop(&self) -> bool {
        self.stop.load(Ordering::Acquire) || self.accepted() >= self.target
    }
}

/// Per-worker running flags. Each flag is cleared only by its own worker (or by the supervisor
/// for a worker that never started).
#[derive(Debug)]
pub struct WorkerStates {
    running: Box<[AtomicBool]>,
}

impl WorkerStates {
    /// All workers start out running so the collector cannot see "all stopped" before spawn.
    pub fn new(workers: usize) -> Self {
        Self {
            running: (0..workers).map(|_| AtomicBool::new(true)).collect(),
        }
    }

    pub fn mark_stopped(&self, worker: usize) {
        if let Some(flag) = self.running.get(worker) {
            flag.store(false, Ordering::Release);
        }
    }

    #[cfg(test)]
    fn is_running(&self, worker: usize) -> bool {
        self.running
            .get(worker)
            .is_some_and(|f| f.load(Ordering::Acquire))
    }

    pub fn running_count(&self) -> usize {
        self.running
            .iter()
            .filter(|f| f.load(Ordering::Acquire))
            .count()
    }

    pub fn all_stopped(&self) -> bool {
        self.running_count() == 0
    }
}

/// Clears a worker's running flag when dropped, including on panic unwind.
pub struct RunningGuard {
    states: Arc<WorkerStates>,
    worker: usize,
}

impl RunningGuard {
    pub fn new(states: Arc<WorkerStates>, worker: usize) -> Self {
        Self { states, worker }
    }
}

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.states.mark_stopped(self.worker);
    }
}

/// Channel and shared state for one run. Workers get clones of `batch_tx`, `signal` and `states`;
/// the collector gets `batch_rx`.
pub struct PipelineChannels {
    pub batch_tx: Sender<Batch>,
    pub batch_rx: Receiver<Batch>,
    pub signal: Arc<StopSignal>,
    pub states: Arc<WorkerStates>,
}

pub fn create_pipeline_channels(opts: &PipelineOpts) -> PipelineChannels {
    let (batch_tx, batch_rx) = match opts.channel_cap() {
        Some(cap) => bounded::<Batch>(cap),
        None => unbounded::<Batch>(),
    };
    PipelineChannels {
        batch_tx,
        batch_rx,
        signal: Arc::new(StopSignal::new(opts.target)),
        states: Arc::new(WorkerStates::new(opts.workers)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ChannelCapacity;

    #[test]
    fn test_stop_signal_trips_on_target() {
        let signal = StopSignal::new(3);
        assert!(!signal.should_stop());
        signal.publish(2);
        assert!(!signal.should_stop());
        signal.publish(3);
        assert!(signal.should_stop());
    }

    #[test]
    fn test_stop_signal_explicit_stop() {
        let signal = StopSignal::new(100);
        signal.request_stop();
        assert!(signal.should_stop());
        assert_eq!(signal.accepted(), 0);
    }

    #[test]
    fn test_running_guard_clears_flag_on_drop() {
        let states = Arc::new(WorkerStates::new(2));
        assert_eq!(states.running_count(), 2);
        {
            let _guard = RunningGuard::new(Arc::clone(&states), 1);
            assert!(states.is_running(1));
        }
        assert!(!states.is_running(1));
        assert!(states.is_running(0));
        states.mark_stopped(0);
        assert!(states.all_stopped());
    }

    #[test]
    fn test_running_guard_clears_flag_on_panic() {
        let states = Arc::new(WorkerStates::new(1));
        let s = Arc::clone(&states);
        let handle = std::thread::spawn(move || {
            let _guard = RunningGuard::new(s, 0);
            panic!("worker blew up");
        });
        assert!(handle.join().is_err());
        assert!(states.all_stopped());
    }

    #[test]
    fn test_channel_capacity_policy() {
        let opts = PipelineOpts {
            target: 1,
            workers: 4,
            ..Default::default()
        };
        assert_eq!(create_pipeline_channels(&opts).batch_tx.capacity(), Some(8));

        let opts = PipelineOpts {
            channel: ChannelCapacity::Bounded(3),
            ..opts
        };
        assert_eq!(create_pipeline_channels(&opts).batch_tx.capacity(), Some(3));

        let opts = PipelineOpts {
            channel: ChannelCapacity::Unbounded,
            ..opts
        };
        assert_eq!(create_pipeline_channels(&opts).batch_tx.capacity(), None);
    }
}
