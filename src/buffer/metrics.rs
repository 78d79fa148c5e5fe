use crate::domain::QueueKind;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

/// Point-in-time view of one severity queue.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueueMetrics {
    pub kind: QueueKind,
    pub capacity: usize,
    pub len: usize,
    pub pushed: u64,
    pub popped: u64,
    pub dropped: u64,
    pub rejected_closed: u64,
    pub peak_len: usize,
    pub closed: bool,
}

impl QueueMetrics {
    pub fn fill_ratio(&self) -> f64 {
        self.len as f64 / self.capacity as f64
    }
}

/// Lock-free counters shared between the producer and consumer halves of a queue.
#[derive(Debug)]
pub(crate) struct QueueMetricsCollector {
    pub(crate) pushed: AtomicU64,
    pub(crate) popped: AtomicU64,
    pub(crate) dropped: AtomicU64,
    pub(crate) rejected_closed: AtomicU64,
    pub(crate) current_len: AtomicUsize,
    pub(crate) peak_len: AtomicUsize,
    pub(crate) closed: AtomicBool,
}

impl QueueMetricsCollector {
    pub(crate) fn new() -> Self {
        Self {
            pushed: AtomicU64::new(0),
            popped: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
            rejected_closed: AtomicU64::new(0),
            current_len: AtomicUsize::new(0),
            peak_len: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
        }
    }

    pub(crate) fn snapshot(&self, kind: QueueKind, capacity: usize) -> QueueMetrics {
        QueueMetrics {
            kind,
            capacity,
            len: self.current_len.load(Ordering::Relaxed),
            pushed: self.pushed.load(Ordering::Relaxed),
            popped: self.popped.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            rejected_closed: self.rejected_closed.load(Ordering::Relaxed),
            peak_len: self.peak_len.load(Ordering::Relaxed),
            closed: self.closed.load(Ordering::Acquire),
        }
    }

    pub(crate) fn update_peak(&self, current: usize) {
        let mut peak = self.peak_len.load(Ordering::Relaxed);
        while current > peak {
            match self.peak_len.compare_exchange_weak(
                peak,
                current,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(x) => peak = x,
            }
        }
    }
}
