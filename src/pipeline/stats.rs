use crate::buffer::QueueMetrics;
use crate::domain::QueueKind;
use crate::reliability::SinkStats;
use crate::sender::WorkerReport;
use serde::Serialize;
use std::time::Duration;

/// Snapshot of every queue, worker and the fallback sink.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineStats {
    pub queues: Vec<QueueMetrics>,
    pub workers: Vec<WorkerReport>,
    pub fallback: SinkStats,
}

impl PipelineStats {
    pub fn queue(&self, kind: QueueKind) -> Option<&QueueMetrics> {
        self.queues.iter().find(|queue| queue.kind == kind)
    }

    pub fn worker(&self, kind: QueueKind) -> Option<&WorkerReport> {
        self.workers.iter().find(|worker| worker.kind == kind)
    }

    pub fn total_dropped(&self) -> u64 {
        self.queues.iter().map(|queue| queue.dropped).sum()
    }

    pub fn total_published(&self) -> u64 {
        self.workers.iter().map(|worker| worker.stats.published).sum()
    }

    pub fn total_fallback(&self) -> u64 {
        self.workers
            .iter()
            .map(|worker| worker.stats.fallback_written)
            .sum()
    }

    pub fn total_discarded(&self) -> u64 {
        self.workers.iter().map(|worker| worker.stats.discarded).sum()
    }
}

/// Result of a completed [`LogPipeline::shutdown`](super::LogPipeline::shutdown).
#[derive(Debug, Clone, Serialize)]
pub struct ShutdownReport {
    pub stats: PipelineStats,
    #[serde(with = "duration_millis")]
    pub elapsed: Duration,
}

mod duration_millis {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis() as u64)
    }
}
