use super::config::PipelineConfig;
use super::handle::{PipelineHandle, QueueSet};
use super::stats::{PipelineStats, ShutdownReport};
use crate::broker::Broker;
use crate::buffer::{QueueReceiver, SeverityQueue};
use crate::domain::{PipelineError, QueueKind};
use crate::reliability::FallbackSink;
use crate::sender::{AtomicWorkerStats, PublisherWorker, WorkerReport};
use futures::future::join_all;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

struct RunningWorker {
    kind: QueueKind,
    topic: String,
    stats: Arc<AtomicWorkerStats>,
    handle: JoinHandle<WorkerReport>,
}

/// Owns the five severity queues, their publisher workers and the broker handle.
///
/// Dropping the pipeline closes the queues; the workers then drain in the background.
/// Use [`LogPipeline::shutdown`] to wait for them.
pub struct LogPipeline {
    queues: Arc<QueueSet>,
    workers: Vec<RunningWorker>,
    broker: Option<Arc<dyn Broker>>,
    sink: FallbackSink,
}

impl LogPipeline {
    /// Create the queues and spawn one worker per queue on the current tokio runtime.
    ///
    /// `broker: None` runs the pipeline in file-only mode.
    pub fn start(
        config: PipelineConfig,
        broker: Option<Arc<dyn Broker>>,
    ) -> Result<Self, PipelineError> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| PipelineError::Runtime(e.to_string()))?;

        let mut receivers: Vec<QueueReceiver> = Vec::with_capacity(QueueKind::ALL_KINDS.len());
        let mut producers = Vec::with_capacity(QueueKind::ALL_KINDS.len());
        for kind in QueueKind::ALL_KINDS {
            let (queue, receiver) = SeverityQueue::bounded(kind, config.capacities.for_kind(kind))?;
            producers.push(queue);
            receivers.push(receiver);
        }

        let [all, info_queue, warning, error_queue, custom]: [SeverityQueue; 5] = producers
            .try_into()
            .map_err(|_| PipelineError::Runtime("queue set is incomplete".to_string()))?;
        let queues = Arc::new(QueueSet::new(
            all,
            info_queue,
            warning,
            error_queue,
            custom,
            config.overflow_pause,
        ));

        let sink = FallbackSink::new(&config.fallback_path);
        let workers = receivers
            .into_iter()
            .map(|receiver| {
                let kind = receiver.kind();
                let topic = config.topics.for_kind(kind).to_string();
                let worker =
                    PublisherWorker::new(receiver, topic.clone(), broker.clone(), sink.clone())
                        .with_console_echo(config.console_echo);
                let stats = worker.stats();
                let handle = runtime.spawn(worker.run());
                RunningWorker {
                    kind,
                    topic,
                    stats,
                    handle,
                }
            })
            .collect();

        info!(
            pubsub = broker.is_some(),
            fallback = %config.fallback_path.display(),
            "Log pipeline started"
        );

        Ok(Self {
            queues,
            workers,
            broker,
            sink,
        })
    }

    /// A new producer handle. Handles stay valid after close; their events are rejected.
    pub fn handle(&self) -> PipelineHandle {
        PipelineHandle::new(self.queues.clone())
    }

    /// Close every queue and release the broker reference. Does not wait for the workers.
    pub fn close(&mut self) {
        let closed = self.queues.close_all();
        if closed > 0 {
            debug!(closed, "Log pipeline queues closed");
        }
        self.broker = None;
    }

    pub fn is_closed(&self) -> bool {
        self.queues.queue(QueueKind::All).is_closed()
    }

    pub fn stats(&self) -> PipelineStats {
        PipelineStats {
            queues: self.queues.metrics(),
            workers: self
                .workers
                .iter()
                .map(|worker| WorkerReport {
                    kind: worker.kind,
                    topic: worker.topic.clone(),
                    stats: worker.stats.snapshot(),
                })
                .collect(),
            fallback: self.sink.stats(),
        }
    }

    /// Close the queues and wait up to `timeout` for every worker to drain.
    pub async fn shutdown(mut self, timeout: Duration) -> Result<ShutdownReport, PipelineError> {
        let started = Instant::now();
        self.close();

        let workers = std::mem::take(&mut self.workers);
        let joins = workers.into_iter().map(|worker| async move {
            (worker.kind, worker.handle.await)
        });

        let results = tokio::time::timeout(timeout, join_all(joins))
            .await
            .map_err(|_| PipelineError::ShutdownTimeout {
                timeout_ms: timeout.as_millis() as u64,
            })?;

        let mut reports = Vec::with_capacity(results.len());
        let mut failure = None;
        for (kind, result) in results {
            match result {
                Ok(report) => reports.push(report),
                Err(e) => {
                    error!(queue = %kind, "Publisher worker failed: {}", e);
                    failure.get_or_insert(PipelineError::WorkerFailed {
                        queue: kind.to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        // Sync whatever the surviving workers wrote before reporting a failure.
        if let Err(e) = self.sink.sync().await {
            warn!("Failed to sync fallback file during shutdown: {}", e);
        }
        if let Some(failure) = failure {
            return Err(failure);
        }

        let stats = PipelineStats {
            queues: self.queues.metrics(),
            workers: reports,
            fallback: self.sink.stats(),
        };
        let elapsed = started.elapsed();
        info!(
            published = stats.total_published(),
            fallback = stats.total_fallback(),
            dropped = stats.total_dropped(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Log pipeline shut down"
        );

        Ok(ShutdownReport { stats, elapsed })
    }
}

impl Drop for LogPipeline {
    fn drop(&mut self) {
        self.queues.close_all();
    }
}

impl std::fmt::Debug for LogPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogPipeline")
            .field("workers", &self.workers.len())
            .field("pubsub", &self.broker.is_some())
            .field("fallback", &self.sink.path())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::MemoryBroker;
    use crate::sender::WorkerState;
    use tempfile::TempDir;

    fn config(temp_dir: &TempDir) -> PipelineConfig {
        PipelineConfig::default().with_fallback_path(temp_dir.path().join("fallback.log"))
    }

    #[test]
    fn start_outside_runtime_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let err = LogPipeline::start(config(&temp_dir), None).unwrap_err();
        assert!(matches!(err, PipelineError::Runtime(_)));
    }

    #[tokio::test]
    async fn zero_capacity_fails_start() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = config(&temp_dir);
        config.capacities.custom = 0;

        let err = LogPipeline::start(config, None).unwrap_err();
        assert!(matches!(err, PipelineError::Buffer(_)));
    }

    #[tokio::test]
    async fn publishes_each_event_on_two_topics() {
        let temp_dir = TempDir::new().unwrap();
        let broker = MemoryBroker::new();
        let pipeline = LogPipeline::start(config(&temp_dir), Some(Arc::new(broker.clone()))).unwrap();

        let handle = pipeline.handle();
        handle.log_warning("Main", "disk almost full");
        handle.log_message("Main", "trace me", "DEBUG");

        let report = pipeline.shutdown(Duration::from_secs(5)).await.unwrap();
        assert_eq!(broker.messages_for("log-warn").len(), 1);
        assert_eq!(broker.messages_for("log-custom").len(), 1);
        assert_eq!(broker.messages_for("logs").len(), 2);
        assert_eq!(report.stats.total_published(), 4);
        assert_eq!(report.stats.total_fallback(), 0);
        assert!(
            report
                .stats
                .workers
                .iter()
                .all(|worker| worker.stats.state == WorkerState::Terminated)
        );
    }

    #[tokio::test]
    async fn worker_failure_is_reported_after_all_workers_finish() {
        use crate::broker::BrokerError;
        use bytes::Bytes;
        use futures::FutureExt;
        use futures::future::BoxFuture;

        // Panics on the error topic, records everything else.
        struct BrokenErrorTopic(MemoryBroker);

        impl Broker for BrokenErrorTopic {
            fn publish(
                &self,
                topic: &str,
                payload: Bytes,
            ) -> BoxFuture<'static, Result<(), BrokerError>> {
                if topic == "log-error" {
                    return async { panic!("broker client bug") }.boxed();
                }
                self.0.publish(topic, payload)
            }

            fn ping(&self) -> BoxFuture<'static, Result<(), BrokerError>> {
                self.0.ping()
            }
        }

        let temp_dir = TempDir::new().unwrap();
        let broker = MemoryBroker::new();
        let pipeline = LogPipeline::start(
            config(&temp_dir),
            Some(Arc::new(BrokenErrorTopic(broker.clone()))),
        )
        .unwrap();

        let handle = pipeline.handle();
        handle.log_error("Main", "boom");
        for i in 0..20 {
            handle.log_info("Main", &format!("INFO {i}"));
        }

        let err = pipeline.shutdown(Duration::from_secs(5)).await.unwrap_err();
        assert!(matches!(err, PipelineError::WorkerFailed { ref queue, .. } if queue == "error"));
        assert_eq!(broker.messages_for("log-info").len(), 20);
        assert_eq!(broker.messages_for("logs").len(), 21);
    }

    #[tokio::test]
    async fn close_is_idempotent_and_rejects_new_events() {
        let temp_dir = TempDir::new().unwrap();
        let mut pipeline = LogPipeline::start(config(&temp_dir), None).unwrap();
        let handle = pipeline.handle();

        pipeline.close();
        pipeline.close();
        assert!(pipeline.is_closed());
        assert!(handle.is_closed());

        handle.log_error("Main", "too late");
        let stats = pipeline.stats();
        assert_eq!(stats.queue(QueueKind::Error).unwrap().rejected_closed, 1);
        assert_eq!(stats.queue(QueueKind::All).unwrap().rejected_closed, 1);
    }

    #[tokio::test]
    async fn dropping_the_pipeline_closes_the_queues() {
        let temp_dir = TempDir::new().unwrap();
        let pipeline = LogPipeline::start(config(&temp_dir), None).unwrap();
        let handle = pipeline.handle();

        drop(pipeline);
        assert!(handle.is_closed());
    }
}
