use crate::app::config::{QueueCapacities, TopicNames};
use std::path::PathBuf;
use std::time::Duration;

/// Settings consumed by [`LogPipeline::start`](super::LogPipeline::start).
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub capacities: QueueCapacities,
    pub topics: TopicNames,
    pub fallback_path: PathBuf,
    /// Fixed pause a producer takes after its event was dropped by a full queue.
    ///
    /// The pause is a blocking `std::thread::sleep` in the logging call. Producers running on
    /// a tokio runtime stall their worker thread for its duration, and on a current-thread
    /// runtime the publisher workers stall with them. Keep it zero for async callers.
    pub overflow_pause: Duration,
    pub console_echo: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            capacities: QueueCapacities::default(),
            topics: TopicNames::default(),
            fallback_path: PathBuf::from("logs/fallback.log"),
            overflow_pause: Duration::ZERO,
            console_echo: false,
        }
    }
}

impl PipelineConfig {
    pub fn with_fallback_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.fallback_path = path.into();
        self
    }
}
