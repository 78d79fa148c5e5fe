use crate::pipeline::PipelineStats;
use prometheus::{Encoder, GaugeVec, IntGauge, IntGaugeVec, Opts, Registry, TextEncoder};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetricsError {
    #[error("Prometheus error: {0}")]
    PrometheusError(#[from] prometheus::Error),
    #[error("Metrics encoding error: {0}")]
    EncodingError(String),
}

/// Prometheus view of a [`PipelineStats`] snapshot.
///
/// Values are gauges set from the latest snapshot, so `update` can be called at any rate.
#[derive(Clone)]
pub struct PipelineMetrics {
    registry: Registry,
    queue_len: IntGaugeVec,
    queue_fill_ratio: GaugeVec,
    queue_pushed: IntGaugeVec,
    queue_dropped: IntGaugeVec,
    queue_rejected: IntGaugeVec,
    worker_published: IntGaugeVec,
    worker_publish_failures: IntGaugeVec,
    worker_fallback: IntGaugeVec,
    worker_discarded: IntGaugeVec,
    fallback_lines: IntGauge,
    fallback_failures: IntGauge,
}

impl PipelineMetrics {
    pub fn new() -> Result<Self, MetricsError> {
        Self::with_registry(Registry::new())
    }

    pub fn with_registry(registry: Registry) -> Result<Self, MetricsError> {
        let queue_gauge = |name: &str, help: &str| -> Result<IntGaugeVec, MetricsError> {
            let gauge = IntGaugeVec::new(Opts::new(name, help), &["queue"])?;
            registry.register(Box::new(gauge.clone()))?;
            Ok(gauge)
        };

        let queue_len = queue_gauge("log_fanout_queue_length", "Payloads buffered per queue")?;
        let queue_pushed = queue_gauge("log_fanout_queue_pushed", "Payloads accepted per queue")?;
        let queue_dropped = queue_gauge(
            "log_fanout_queue_dropped",
            "Payloads dropped because the queue was full",
        )?;
        let queue_rejected = queue_gauge(
            "log_fanout_queue_rejected_closed",
            "Payloads rejected because the queue was closed",
        )?;
        let worker_published =
            queue_gauge("log_fanout_worker_published", "Payloads published to the broker")?;
        let worker_publish_failures = queue_gauge(
            "log_fanout_worker_publish_failures",
            "Broker publish attempts that failed",
        )?;
        let worker_fallback = queue_gauge(
            "log_fanout_worker_fallback_written",
            "Payloads written to the fallback file",
        )?;
        let worker_discarded = queue_gauge(
            "log_fanout_worker_discarded",
            "Payloads lost after a fallback write failure",
        )?;

        let queue_fill_ratio = GaugeVec::new(
            Opts::new("log_fanout_queue_fill_ratio", "Queue length over capacity"),
            &["queue"],
        )?;
        registry.register(Box::new(queue_fill_ratio.clone()))?;

        let fallback_lines = IntGauge::new(
            "log_fanout_fallback_lines_written",
            "Lines appended to the fallback file",
        )?;
        registry.register(Box::new(fallback_lines.clone()))?;

        let fallback_failures = IntGauge::new(
            "log_fanout_fallback_write_failures",
            "Failed fallback file writes",
        )?;
        registry.register(Box::new(fallback_failures.clone()))?;

        Ok(Self {
            registry,
            queue_len,
            queue_fill_ratio,
            queue_pushed,
            queue_dropped,
            queue_rejected,
            worker_published,
            worker_publish_failures,
            worker_fallback,
            worker_discarded,
            fallback_lines,
            fallback_failures,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn update(&self, stats: &PipelineStats) {
        for queue in &stats.queues {
            let label = [queue.kind.as_str()];
            self.queue_len.with_label_values(&label).set(queue.len as i64);
            self.queue_fill_ratio
                .with_label_values(&label)
                .set(queue.fill_ratio());
            self.queue_pushed
                .with_label_values(&label)
                .set(queue.pushed as i64);
            self.queue_dropped
                .with_label_values(&label)
                .set(queue.dropped as i64);
            self.queue_rejected
                .with_label_values(&label)
                .set(queue.rejected_closed as i64);
        }

        for worker in &stats.workers {
            let label = [worker.kind.as_str()];
            self.worker_published
                .with_label_values(&label)
                .set(worker.stats.published as i64);
            self.worker_publish_failures
                .with_label_values(&label)
                .set(worker.stats.publish_failures as i64);
            self.worker_fallback
                .with_label_values(&label)
                .set(worker.stats.fallback_written as i64);
            self.worker_discarded
                .with_label_values(&label)
                .set(worker.stats.discarded as i64);
        }

        self.fallback_lines.set(stats.fallback.lines_written as i64);
        self.fallback_failures
            .set(stats.fallback.write_failures as i64);
    }

    /// Render the registry in the Prometheus text exposition format.
    pub fn render(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| MetricsError::EncodingError(e.to_string()))
    }
}
