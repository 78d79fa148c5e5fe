pub mod fallback;
#[cfg(feature = "metrics")]
pub mod metrics;

pub use fallback::{FallbackSink, SinkError, SinkStats};
#[cfg(feature = "metrics")]
pub use metrics::{MetricsError, PipelineMetrics};
