use super::stats::{AtomicWorkerStats, WorkerStats};
use crate::broker::Broker;
use crate::buffer::QueueReceiver;
use crate::domain::QueueKind;
use crate::reliability::FallbackSink;
use bytes::Bytes;
use serde::Serialize;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Lifecycle of a publisher worker. There is no way back to an earlier state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum WorkerState {
    /// Consuming from an open queue.
    #[default]
    Running = 0,
    /// Queue closed, still consuming buffered payloads.
    Draining = 1,
    /// Queue closed and empty.
    Terminated = 2,
}

impl WorkerState {
    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            1 => WorkerState::Draining,
            2 => WorkerState::Terminated,
            _ => WorkerState::Running,
        }
    }
}

/// Where a single payload ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Published,
    Fallback,
    Discarded,
}

/// Final account returned by a worker once its queue is closed and drained.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkerReport {
    pub kind: QueueKind,
    pub topic: String,
    pub stats: WorkerStats,
}

/// Drains one severity queue into the broker, falling back to the file sink.
pub struct PublisherWorker {
    receiver: QueueReceiver,
    topic: String,
    broker: Option<Arc<dyn Broker>>,
    sink: FallbackSink,
    stats: Arc<AtomicWorkerStats>,
    console_echo: bool,
}

impl PublisherWorker {
    /// `broker: None` means pub/sub is disabled and every payload goes to `sink`.
    pub fn new(
        receiver: QueueReceiver,
        topic: impl Into<String>,
        broker: Option<Arc<dyn Broker>>,
        sink: FallbackSink,
    ) -> Self {
        Self {
            receiver,
            topic: topic.into(),
            broker,
            sink,
            stats: Arc::new(AtomicWorkerStats::new()),
            console_echo: false,
        }
    }

    /// Also print each payload through `tracing` at a level matching the queue.
    pub fn with_console_echo(mut self, console_echo: bool) -> Self {
        self.console_echo = console_echo;
        self
    }

    pub fn kind(&self) -> QueueKind {
        self.receiver.kind()
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn stats(&self) -> Arc<AtomicWorkerStats> {
        self.stats.clone()
    }

    pub fn spawn(self) -> JoinHandle<WorkerReport> {
        tokio::spawn(self.run())
    }

    pub async fn run(mut self) -> WorkerReport {
        let kind = self.receiver.kind();
        debug!(queue = %kind, topic = %self.topic, "Publisher worker started");

        while let Some(payload) = self.receiver.recv().await {
            if self.stats.state() == WorkerState::Running && self.receiver.is_closed() {
                self.stats.set_state(WorkerState::Draining);
                debug!(queue = %kind, remaining = self.receiver.len(), "Queue closed, draining");
            }
            self.deliver(payload).await;
        }

        self.stats.set_state(WorkerState::Terminated);
        let stats = self.stats.snapshot();
        info!(
            queue = %kind,
            topic = %self.topic,
            published = stats.published,
            fallback = stats.fallback_written,
            discarded = stats.discarded,
            "Publisher worker terminated"
        );

        WorkerReport {
            kind,
            topic: self.topic,
            stats,
        }
    }

    /// Forward one payload. Failures never propagate: each payload is handled on its own.
    pub async fn deliver(&self, payload: Bytes) -> Delivery {
        if self.console_echo {
            self.echo(&payload);
        }

        if let Some(broker) = &self.broker {
            match broker.publish(&self.topic, payload.clone()).await {
                Ok(()) => {
                    self.stats.record_published();
                    return Delivery::Published;
                }
                Err(e) => {
                    self.stats.record_publish_failure();
                    error!(
                        topic = %self.topic,
                        "Failed to publish log to broker, writing to fallback file: {}", e
                    );
                }
            }
        }

        match self.sink.write(&payload).await {
            Ok(()) => {
                self.stats.record_fallback();
                Delivery::Fallback
            }
            Err(e) => {
                self.stats.record_discarded();
                error!(
                    path = %self.sink.path().display(),
                    "Failed to write log to fallback file, event discarded: {}", e
                );
                Delivery::Discarded
            }
        }
    }

    fn echo(&self, payload: &[u8]) {
        let line = String::from_utf8_lossy(payload);
        match self.receiver.kind() {
            QueueKind::Error => error!(target: "log_fanout::echo", "{}", line),
            QueueKind::Warning => warn!(target: "log_fanout::echo", "{}", line),
            QueueKind::Custom => debug!(target: "log_fanout::echo", "{}", line),
            QueueKind::All | QueueKind::Info => info!(target: "log_fanout::echo", "{}", line),
        }
    }
}
