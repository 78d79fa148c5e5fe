pub mod config;
pub mod handle;
pub mod lifecycle;
pub mod stats;

pub use config::PipelineConfig;
pub use handle::{EventLogger, PipelineHandle};
pub use lifecycle::LogPipeline;
pub use stats::{PipelineStats, ShutdownReport};
