//! Progress reporting: the fire-and-forget capability the pipeline advances, and kdam bars behind it.

use kdam::{Animation, Bar, BarExt};
use std::sync::{Arc, Mutex};

/// Which bar an event belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Task {
    /// Unique entries accepted by the collector.
    Total,
    /// Candidates produced by one worker in its current batch.
    Worker(usize),
}

/// Receives progress events. Must never block the caller meaningfully; failures are swallowed.
pub trait ProgressReporter: Send + Sync {
    /// A task (re)starts with `total` expected steps. Workers call this once per batch.
    fn start_task(&self, _task: Task, _total: usize) {}

    fn advance(&self, task: Task);

    fn finish_task(&self, _task: Task) {}
}

/// Discards every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn advance(&self, _task: Task) {}
}

// Progress bar type alias
pub type ProgressBar = Arc<Mutex<Bar>>;

/// Configuration for creating a progress bar
pub struct ProgressBarConfig {
    pub total: usize,
    pub desc: String,
    pub animation: Animation,
    pub position: u16,
}

impl ProgressBarConfig {
    /// Create a new progress bar configuration
    pub fn new(total: usize, desc: impl Into<String>, animation: Animation, position: u16) -> Self {
        Self {
            total,
            desc: desc.into(),
            animation,
            position,
        }
    }
}

/// Create a progress bar with the given configuration
pub fn create_progress_bar(config: ProgressBarConfig) -> ProgressBar {
    Arc::new(Mutex::new(kdam::tqdm!(
        total = config.total,
        desc = config.desc,
        animation = config.animation,
        position = config.position,
        unit = " names"
    )))
}

/// Update progress bar if available.
/// Uses try_lock so a contended bar never blocks a worker; the bar catches up on the next update.
pub fn update_progress_bar(pb: &ProgressBar, n: usize) {
    if let Ok(mut pb) = pb.try_lock() {
        let _ = pb.update(n);
    }
}

/// Reset a bar to zero with a new total (worker bars restart every batch).
pub fn reset_bar(pb: &ProgressBar, total: usize) {
    if let Ok(mut bar) = pb.try_lock() {
        bar.reset(Some(total));
    }
}

/// Force a refresh of the bar.
pub fn refresh_bar(pb: &ProgressBar) {
    if let Ok(mut bar) = pb.try_lock() {
        let _ = bar.refresh();
    }
}

/// One bar for accepted entries and one per worker for its current batch.
pub struct KdamProgress {
    total: ProgressBar,
    workers: Vec<ProgressBar>,
}

impl KdamProgress {
    pub fn new(target: usize, workers: usize, batch_size: usize) -> Self {
        let total = create_progress_bar(ProgressBarConfig::new(
            target,
            "Total Progress",
            Animation::Classic,
            0,
        ));
        let workers = (0..workers)
            .map(|i| {
                create_progress_bar(ProgressBarConfig::new(
                    batch_size,
                    format!("Worker-{}", i + 1),
                    Animation::Classic,
                    u16::try_from(i + 1).unwrap_or(u16::MAX),
                ))
            })
            .collect();
        Self { total, workers }
    }

    fn bar(&self, task: Task) -> Option<&ProgressBar> {
        match task {
            Task::Total => Some(&self.total),
            Task::Worker(i) => self.workers.get(i),
        }
    }

    /// Redraw every bar once so the final state is on screen.
    pub fn finish(&self) {
        for bar in self.workers.iter().chain(std::iter::once(&self.total)) {
            refresh_bar(bar);
        }
        eprintln!();
    }
}

impl ProgressReporter for KdamProgress {
    fn start_task(&self, task: Task, total: usize) {
        if let Some(bar) = self.bar(task) {
            reset_bar(bar, total);
        }
    }

    fn advance(&self, task: Task) {
        if let Some(bar) = self.bar(task) {
            update_progress_bar(bar, 1);
        }
    }

    fn finish_task(&self, task: Task) {
        if let Some(bar) = self.bar(task) {
            refresh_bar(bar);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_worker_task_is_ignored() {
        let progress = KdamProgress::new(10, 2, 5);
        assert!(progress.bar(Task::Worker(5)).is_none());
        progress.advance(Task::Worker(5));
        progress.advance(Task::Total);
    }
}
