use crate::buffer::{BufferError, QueueMetrics, SeverityQueue};
use crate::domain::{Level, LogEvent, QueueKind};
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Application-facing logging interface. Every call is fire-and-forget.
pub trait EventLogger: Send + Sync {
    fn log_info(&self, service: &str, message: &str);
    fn log_warning(&self, service: &str, message: &str);
    fn log_error(&self, service: &str, message: &str);
    /// Route an event with an arbitrary level string to the custom queue.
    fn log_message(&self, service: &str, message: &str, level: &str);
}

/// The five producer halves, indexed by [`QueueKind`].
#[derive(Debug)]
pub(crate) struct QueueSet {
    all: SeverityQueue,
    info: SeverityQueue,
    warning: SeverityQueue,
    error: SeverityQueue,
    custom: SeverityQueue,
    overflow_pause: Duration,
}

impl QueueSet {
    pub(crate) fn new(
        all: SeverityQueue,
        info: SeverityQueue,
        warning: SeverityQueue,
        error: SeverityQueue,
        custom: SeverityQueue,
        overflow_pause: Duration,
    ) -> Self {
        Self {
            all,
            info,
            warning,
            error,
            custom,
            overflow_pause,
        }
    }

    pub(crate) fn queue(&self, kind: QueueKind) -> &SeverityQueue {
        match kind {
            QueueKind::All => &self.all,
            QueueKind::Info => &self.info,
            QueueKind::Warning => &self.warning,
            QueueKind::Error => &self.error,
            QueueKind::Custom => &self.custom,
        }
    }

    /// Close every queue. Returns how many were still open.
    pub(crate) fn close_all(&self) -> usize {
        QueueKind::ALL_KINDS
            .into_iter()
            .filter(|kind| self.queue(*kind).close())
            .count()
    }

    pub(crate) fn metrics(&self) -> Vec<QueueMetrics> {
        QueueKind::ALL_KINDS
            .into_iter()
            .map(|kind| self.queue(kind).metrics())
            .collect()
    }
}

/// Cheap, cloneable producer handle. It can only enqueue.
#[derive(Debug, Clone)]
pub struct PipelineHandle {
    queues: Arc<QueueSet>,
}

impl PipelineHandle {
    pub(crate) fn new(queues: Arc<QueueSet>) -> Self {
        Self { queues }
    }

    pub fn log_info(&self, service: &str, message: &str) {
        self.emit(QueueKind::Info, Level::Info, service, message);
    }

    pub fn log_warning(&self, service: &str, message: &str) {
        self.emit(QueueKind::Warning, Level::Warning, service, message);
    }

    pub fn log_error(&self, service: &str, message: &str) {
        self.emit(QueueKind::Error, Level::Error, service, message);
    }

    /// The level string is carried verbatim; the event always goes to the custom queue.
    pub fn log_message(&self, service: &str, message: &str, level: &str) {
        self.emit(QueueKind::Custom, Level::from(level), service, message);
    }

    /// Emit an already-typed level on the queue it maps to.
    pub fn log(&self, level: Level, service: &str, message: &str) {
        self.emit(level.queue_kind(), level, service, message);
    }

    /// Whether the pipeline behind this handle has been closed.
    pub fn is_closed(&self) -> bool {
        self.queues.queue(QueueKind::All).is_closed()
    }

    fn emit(&self, kind: QueueKind, level: Level, service: &str, message: &str) {
        let event = LogEvent::new(level, service, message);
        let payload = match event.to_payload() {
            Ok(payload) => payload,
            Err(e) => {
                error!(service, "Failed to serialize log event, event dropped: {}", e);
                return;
            }
        };

        self.enqueue(kind, payload.clone());
        self.enqueue(QueueKind::All, payload);
    }

    fn enqueue(&self, kind: QueueKind, payload: Bytes) {
        let Err(e) = self.queues.queue(kind).try_enqueue(payload) else {
            return;
        };

        match e {
            BufferError::Full { capacity, .. } => {
                warn!(queue = %kind, capacity, "Log queue is full, event dropped");
                if !self.queues.overflow_pause.is_zero() {
                    std::thread::sleep(self.queues.overflow_pause);
                }
            }
            BufferError::Closed { .. } => {
                debug!(queue = %kind, "Log queue is closed, event dropped");
            }
            BufferError::InvalidCapacity { .. } => {}
        }
    }
}

impl EventLogger for PipelineHandle {
    fn log_info(&self, service: &str, message: &str) {
        PipelineHandle::log_info(self, service, message);
    }

    fn log_warning(&self, service: &str, message: &str) {
        PipelineHandle::log_warning(self, service, message);
    }

    fn log_error(&self, service: &str, message: &str) {
        PipelineHandle::log_error(self, service, message);
    }

    fn log_message(&self, service: &str, message: &str, level: &str) {
        PipelineHandle::log_message(self, service, message, level);
    }
}
