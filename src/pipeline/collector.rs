//! Collector: the single owner of the seen set and the sink. Drains batches, drops repeats,
//! appends new entries in acceptance order and decides when the run is over.

use crossbeam_channel::{Receiver, RecvTimeoutError};
use log::{debug, info, warn};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::engine::progress::{ProgressReporter, Task};
use crate::sink::Sink;
use crate::utils::config::PipelineDefaults;
use crate::{Batch, Candidate, CollectStats, PipelineError, StopReason};

use super::context::{StopSignal, WorkerStates};

/// Parameters for [`Collector::run`].
pub struct CollectParams<'a> {
    pub batch_wait: Duration,
    /// Floor of consecutive repeated candidates before giving up. 0 disables.
    /// See [`Collector::stall_threshold`].
    pub stall_candidates: usize,
    pub signal: &'a StopSignal,
    pub states: &'a WorkerStates,
    pub cancel: Option<&'a AtomicBool>,
    pub progress: &'a dyn ProgressReporter,
}

/// What the collector ended with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Collected {
    pub reason: StopReason,
    pub accepted: usize,
    pub stats: CollectStats,
}

pub struct Collector<'s, S: Sink + ?Sized> {
    seen: HashSet<Candidate>,
    accepted: usize,
    target: usize,
    /// Repeated candidates since the last accepted one.
    fruitless: usize,
    stats: CollectStats,
    sink: &'s mut S,
}

impl<'s, S: Sink + ?Sized> Collector<'s, S> {
    pub fn new(sink: &'s mut S, target: usize) -> Self {
        Self {
            seen: HashSet::new(),
            accepted: 0,
            target,
            fruitless: 0,
            stats: CollectStats::default(),
            sink,
        }
    }

    pub fn accepted(&self) -> usize {
        self.accepted
    }

    pub fn is_complete(&self) -> bool {
        self.accepted >= self.target
    }

    pub fn stats(&self) -> CollectStats {
        self.stats
    }

    /// Consecutive repeats seen since the last newly accepted candidate.
    pub fn fruitless(&self) -> usize {
        self.fruitless
    }

    /// Repeats in a row that end the run: `floor`, raised to `STALL_SEEN_FACTOR` draws per
    /// accepted entry so a finite source still gets to its last unseen values. 0 disables.
    pub fn stall_threshold(&self, floor: usize) -> Option<usize> {
        if floor == 0 {
            return None;
        }
        Some(floor.max(
            self.seen
                .len()
                .saturating_mul(PipelineDefaults::STALL_SEEN_FACTOR),
        ))
    }

    /// Process one batch in order. Returns how many candidates were newly accepted.
    ///
    /// An entry is appended to the sink before it enters the seen set, so on a sink error the
    /// failing candidate is in neither.
    pub fn accept_batch(
        &mut self,
        batch: Batch,
        signal: &StopSignal,
        progress: &dyn ProgressReporter,
    ) -> Result<usize, PipelineError> {
        self.stats.batches += 1;
        self.stats.received += batch.len();
        let before = self.accepted;

        let mut candidates = batch.candidates.into_iter();
        while let Some(candidate) = candidates.next() {
            if self.is_complete() {
                self.stats.surplus += 1 + candidates.len();
                break;
            }
            if self.seen.contains(&candidate) {
                self.stats.duplicates += 1;
                self.fruitless += 1;
                continue;
            }
            self.sink
                .append(&candidate)
                .map_err(|source| PipelineError::Sink {
                    accepted: self.accepted,
                    source,
                })?;
            self.seen.insert(candidate);
            self.accepted += 1;
            self.fruitless = 0;
            signal.publish(self.accepted);
            progress.advance(Task::Total);
        }
        Ok(self.accepted - before)
    }

    /// Drain `batch_rx` until the target is reached, the workers are exhausted, progress stalls
    /// or the run is cancelled. The receive timeout is a liveness check only; it is retried
    /// until one of those conditions holds.
    pub fn run(
        mut self,
        batch_rx: &Receiver<Batch>,
        params: &CollectParams<'_>,
    ) -> Result<Collected, PipelineError> {
        let reason = loop {
            if self.is_complete() {
                break StopReason::TargetReached;
            }
            if params.cancel.is_some_and(|c| c.load(Ordering::Relaxed)) {
                info!("Generation cancelled; keeping {} entries", self.accepted);
                break StopReason::Cancelled;
            }
            match batch_rx.recv_timeout(params.batch_wait) {
                Ok(batch) => {
                    let worker = batch.worker;
                    self.accept_batch(batch, params.signal, params.progress)?;
                    if self.is_complete() {
                        continue;
                    }
                    if let Some(limit) = self.stall_threshold(params.stall_candidates)
                        && self.fruitless >= limit
                    {
                        warn!(
                            "No new entries in the last {} candidates (last from Worker-{}); stopping at {}",
                            self.fruitless,
                            worker + 1,
                            self.accepted
                        );
                        break StopReason::Stalled;
                    }
                }
                Err(RecvTimeoutError::Timeout) => {
                    // Workers send before clearing their flag, so an empty channel after
                    // "all stopped" means nothing more is coming.
                    if params.states.all_stopped() && batch_rx.is_empty() {
                        info!("All workers finished");
                        break StopReason::Exhausted;
                    }
                }
                Err(RecvTimeoutError::Disconnected) => {
                    debug!("collector: channel closed");
                    break StopReason::Exhausted;
                }
            }
        };
        debug!(
            "collector: {:?} with {}/{} accepted ({:?})",
            reason, self.accepted, self.target, self.stats
        );
        Ok(Collected {
            reason,
            accepted: self.accepted,
            stats: self.stats,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::progress::NoProgress;

    fn batch(worker: usize, items: &[&str]) -> Batch {
        Batch {
            worker,
            candidates: items.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_accept_batch_dedups_within_and_across_batches() {
        let mut sink: Vec<String> = Vec::new();
        let signal = StopSignal::new(10);
        let mut collector = Collector::new(&mut sink, 10);

        assert_eq!(
            collector
                .accept_batch(batch(0, &["a", "b", "a"]), &signal, &NoProgress)
                .unwrap(),
            2
        );
        assert_eq!(
            collector
                .accept_batch(batch(1, &["b", "c"]), &signal, &NoProgress)
                .unwrap(),
            1
        );
        assert_eq!(collector.stats().duplicates, 2);
        assert_eq!(signal.accepted(), 3);
        drop(collector);
        assert_eq!(sink, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_accept_batch_stops_at_target_and_counts_surplus() {
        let mut sink: Vec<String> = Vec::new();
        let signal = StopSignal::new(2);
        let mut collector = Collector::new(&mut sink, 2);

        collector
            .accept_batch(batch(0, &["a", "b", "c", "d"]), &signal, &NoProgress)
            .unwrap();
        assert!(collector.is_complete());
        assert_eq!(collector.stats().surplus, 2);
        assert!(signal.should_stop());
        drop(collector);
        assert_eq!(sink, vec!["a", "b"]);
    }

    #[test]
    fn test_run_exhausts_when_channel_closes() {
        let (tx, rx) = crossbeam_channel::unbounded();
        tx.send(batch(0, &["x", "y", "x"])).unwrap();
        drop(tx);

        let mut sink: Vec<String> = Vec::new();
        let signal = StopSignal::new(5);
        let states = WorkerStates::new(1);
        let params = CollectParams {
            batch_wait: Duration::from_millis(10),
            stall_candidates: 0,
            signal: &signal,
            states: &states,
            cancel: None,
            progress: &NoProgress,
        };
        let collected = Collector::new(&mut sink, 5).run(&rx, &params).unwrap();
        assert_eq!(collected.reason, StopReason::Exhausted);
        assert_eq!(collected.accepted, 2);
    }

    #[test]
    fn test_run_exhausts_on_timeout_when_all_workers_stopped() {
        // Sender kept alive (as a detached worker would) so only the timeout path can end the run.
        let (_tx, rx) = crossbeam_channel::unbounded::<Batch>();
        let mut sink: Vec<String> = Vec::new();
        let signal = StopSignal::new(5);
        let states = WorkerStates::new(2);
        states.mark_stopped(0);
        states.mark_stopped(1);
        let params = CollectParams {
            batch_wait: Duration::from_millis(5),
            stall_candidates: 0,
            signal: &signal,
            states: &states,
            cancel: None,
            progress: &NoProgress,
        };
        let collected = Collector::new(&mut sink, 5).run(&rx, &params).unwrap();
        assert_eq!(collected.reason, StopReason::Exhausted);
        assert_eq!(collected.accepted, 0);
    }

    fn stall_params<'a>(
        signal: &'a StopSignal,
        states: &'a WorkerStates,
        stall_candidates: usize,
    ) -> CollectParams<'a> {
        CollectParams {
            batch_wait: Duration::from_millis(10),
            stall_candidates,
            signal,
            states,
            cancel: None,
            progress: &NoProgress,
        }
    }

    #[test]
    fn test_stall_threshold_scales_with_seen_set() {
        let mut sink: Vec<String> = Vec::new();
        let signal = StopSignal::new(1000);
        let mut collector = Collector::new(&mut sink, 1000);
        assert_eq!(collector.stall_threshold(0), None);
        assert_eq!(collector.stall_threshold(50), Some(50));

        let words: Vec<String> = (0..10).map(|i| format!("w{i}")).collect();
        let refs: Vec<&str> = words.iter().map(String::as_str).collect();
        collector
            .accept_batch(batch(0, &refs), &signal, &NoProgress)
            .unwrap();
        let scaled = 10 * PipelineDefaults::STALL_SEEN_FACTOR;
        assert_eq!(collector.stall_threshold(50), Some(scaled));
        assert_eq!(collector.stall_threshold(10_000), Some(10_000));
    }

    #[test]
    fn test_fruitless_counts_candidates_and_resets_on_accept() {
        let mut sink: Vec<String> = Vec::new();
        let signal = StopSignal::new(10);
        let mut collector = Collector::new(&mut sink, 10);
        collector
            .accept_batch(batch(0, &["a", "a", "a"]), &signal, &NoProgress)
            .unwrap();
        collector
            .accept_batch(batch(0, &["a", "a"]), &signal, &NoProgress)
            .unwrap();
        assert_eq!(collector.fruitless(), 4);
        collector
            .accept_batch(batch(0, &["a", "b"]), &signal, &NoProgress)
            .unwrap();
        assert_eq!(collector.fruitless(), 0);
    }

    #[test]
    fn test_run_stalls_after_fruitless_candidates() {
        let (tx, rx) = crossbeam_channel::unbounded();
        tx.send(batch(0, &["same"])).unwrap();
        for _ in 0..10 {
            tx.send(batch(0, &["same", "same", "same", "same"])).unwrap();
        }
        let mut sink: Vec<String> = Vec::new();
        let signal = StopSignal::new(3);
        let states = WorkerStates::new(1);
        let params = stall_params(&signal, &states, 8);
        let collected = Collector::new(&mut sink, 3).run(&rx, &params).unwrap();
        assert_eq!(collected.reason, StopReason::Stalled);
        assert_eq!(collected.accepted, 1);
        // 1 accepted entry raises the floor of 8 to STALL_SEEN_FACTOR repeats
        let per_batch = 4;
        let expected = 1 + PipelineDefaults::STALL_SEEN_FACTOR.max(8).div_ceil(per_batch);
        assert_eq!(collected.stats.batches, expected);
    }

    #[test]
    fn test_run_keeps_going_while_repeats_stay_under_threshold() {
        let (tx, rx) = crossbeam_channel::unbounded();
        tx.send(batch(0, &["a"])).unwrap();
        for _ in 0..5 {
            tx.send(batch(0, &["a", "a"])).unwrap();
        }
        tx.send(batch(0, &["b", "c"])).unwrap();
        drop(tx);
        let mut sink: Vec<String> = Vec::new();
        let signal = StopSignal::new(3);
        let states = WorkerStates::new(1);
        let params = stall_params(&signal, &states, 8);
        let collected = Collector::new(&mut sink, 3).run(&rx, &params).unwrap();
        assert_eq!(collected.reason, StopReason::TargetReached);
        assert_eq!(collected.accepted, 3);
    }
}
