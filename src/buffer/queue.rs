use super::error::BufferError;
use super::metrics::{QueueMetrics, QueueMetricsCollector};
use crate::domain::QueueKind;
use bytes::Bytes;
use parking_lot::RwLock;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use tokio::sync::mpsc::{self, error::TryRecvError, error::TrySendError};

const MAX_CAPACITY: usize = 100_000_000;

/// Producer half of a bounded severity queue.
///
/// Any number of producers may call [`SeverityQueue::try_enqueue`] concurrently through a
/// shared reference. Exactly one [`QueueReceiver`] consumes the payloads in FIFO order.
pub struct SeverityQueue {
    kind: QueueKind,
    capacity: usize,
    // `None` once closed; dropping the last sender lets the receiver drain and finish.
    sender: RwLock<Option<mpsc::Sender<Bytes>>>,
    metrics: Arc<QueueMetricsCollector>,
}

impl SeverityQueue {
    pub fn bounded(kind: QueueKind, capacity: usize) -> Result<(Self, QueueReceiver), BufferError> {
        if capacity == 0 || capacity > MAX_CAPACITY {
            return Err(BufferError::InvalidCapacity { kind, capacity });
        }

        let (sender, receiver) = mpsc::channel(capacity);
        let metrics = Arc::new(QueueMetricsCollector::new());

        let queue = Self {
            kind,
            capacity,
            sender: RwLock::new(Some(sender)),
            metrics: metrics.clone(),
        };
        let receiver = QueueReceiver {
            kind,
            receiver,
            metrics,
        };

        Ok((queue, receiver))
    }

    pub fn kind(&self) -> QueueKind {
        self.kind
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.metrics.current_len.load(Ordering::Relaxed)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_closed(&self) -> bool {
        self.metrics.closed.load(Ordering::Acquire)
    }

    /// Append `payload` if there is room, without waiting.
    ///
    /// A full queue drops the payload and bumps the `dropped` counter; a closed queue drops
    /// it and bumps `rejected_closed`. The queue contents are left untouched either way.
    pub fn try_enqueue(&self, payload: Bytes) -> Result<(), BufferError> {
        let guard = self.sender.read();
        let Some(sender) = guard.as_ref() else {
            self.metrics.rejected_closed.fetch_add(1, Ordering::Relaxed);
            return Err(BufferError::Closed { kind: self.kind });
        };

        // Reserve the slot in the length gauge before the consumer can observe the payload.
        let len = self.metrics.current_len.fetch_add(1, Ordering::AcqRel) + 1;

        match sender.try_send(payload) {
            Ok(()) => {
                self.metrics.pushed.fetch_add(1, Ordering::Relaxed);
                self.metrics.update_peak(len);
                Ok(())
            }
            Err(TrySendError::Full(_)) => {
                self.metrics.current_len.fetch_sub(1, Ordering::AcqRel);
                self.metrics.dropped.fetch_add(1, Ordering::Relaxed);
                Err(BufferError::Full {
                    kind: self.kind,
                    capacity: self.capacity,
                })
            }
            Err(TrySendError::Closed(_)) => {
                // The consumer went away without the queue being closed.
                self.metrics.current_len.fetch_sub(1, Ordering::AcqRel);
                self.metrics.rejected_closed.fetch_add(1, Ordering::Relaxed);
                Err(BufferError::Closed { kind: self.kind })
            }
        }
    }

    /// Stop accepting payloads. Returns `true` for the call that actually closed the queue.
    pub fn close(&self) -> bool {
        let closed_now = self.sender.write().take().is_some();
        if closed_now {
            self.metrics.closed.store(true, Ordering::Release);
        }
        closed_now
    }

    pub fn metrics(&self) -> QueueMetrics {
        self.metrics.snapshot(self.kind, self.capacity)
    }
}

impl std::fmt::Debug for SeverityQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let metrics = self.metrics();
        f.debug_struct("SeverityQueue")
            .field("kind", &self.kind)
            .field("capacity", &self.capacity)
            .field("len", &metrics.len)
            .field("pushed", &metrics.pushed)
            .field("dropped", &metrics.dropped)
            .field("closed", &metrics.closed)
            .finish()
    }
}

/// Consumer half of a severity queue, owned by exactly one publisher worker.
pub struct QueueReceiver {
    kind: QueueKind,
    receiver: mpsc::Receiver<Bytes>,
    metrics: Arc<QueueMetricsCollector>,
}

impl QueueReceiver {
    pub fn kind(&self) -> QueueKind {
        self.kind
    }

    /// Wait for the next payload. Returns `None` once the queue is closed and drained.
    pub async fn recv(&mut self) -> Option<Bytes> {
        let payload = self.receiver.recv().await?;
        self.record_pop();
        Some(payload)
    }

    /// Take the next buffered payload without waiting.
    pub fn try_recv(&mut self) -> Option<Bytes> {
        match self.receiver.try_recv() {
            Ok(payload) => {
                self.record_pop();
                Some(payload)
            }
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.metrics.closed.load(Ordering::Acquire)
    }

    pub fn len(&self) -> usize {
        self.metrics.current_len.load(Ordering::Relaxed)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn record_pop(&self) {
        self.metrics.popped.fetch_add(1, Ordering::Relaxed);
        self.metrics.current_len.fetch_sub(1, Ordering::AcqRel);
    }
}

impl std::fmt::Debug for QueueReceiver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueReceiver")
            .field("kind", &self.kind)
            .field("len", &self.len())
            .finish()
    }
}
