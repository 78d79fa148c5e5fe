// Lock-free per-worker delivery counters.

use super::worker::WorkerState;
use serde::Serialize;
use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};

/// Snapshot of one publisher worker's counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WorkerStats {
    pub published: u64,
    pub publish_failures: u64,
    pub fallback_written: u64,
    pub discarded: u64,
    pub state: WorkerState,
}

impl WorkerStats {
    /// Payloads that reached either the broker or the fallback file.
    pub fn delivered(&self) -> u64 {
        self.published + self.fallback_written
    }

    /// Every payload the worker took off its queue.
    pub fn processed(&self) -> u64 {
        self.delivered() + self.discarded
    }
}

#[derive(Debug, Default)]
pub struct AtomicWorkerStats {
    published: AtomicU64,
    publish_failures: AtomicU64,
    fallback_written: AtomicU64,
    discarded: AtomicU64,
    state: AtomicU8,
}

impl AtomicWorkerStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_published(&self) {
        self.published.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_publish_failure(&self) {
        self.publish_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fallback(&self) {
        self.fallback_written.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_discarded(&self) {
        self.discarded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn set_state(&self, state: WorkerState) {
        self.state.store(state as u8, Ordering::Release);
    }

    pub fn state(&self) -> WorkerState {
        WorkerState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn snapshot(&self) -> WorkerStats {
        WorkerStats {
            published: self.published.load(Ordering::Relaxed),
            publish_failures: self.publish_failures.load(Ordering::Relaxed),
            fallback_written: self.fallback_written.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
            state: self.state(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reflects_recorded_outcomes() {
        let stats = AtomicWorkerStats::new();
        stats.record_published();
        stats.record_publish_failure();
        stats.record_fallback();
        stats.record_discarded();
        stats.set_state(WorkerState::Draining);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.published, 1);
        assert_eq!(snapshot.publish_failures, 1);
        assert_eq!(snapshot.delivered(), 2);
        assert_eq!(snapshot.processed(), 3);
        assert_eq!(snapshot.state, WorkerState::Draining);
    }

    #[test]
    fn new_stats_start_running() {
        assert_eq!(AtomicWorkerStats::new().state(), WorkerState::Running);
    }
}
