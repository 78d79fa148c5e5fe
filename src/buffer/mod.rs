pub mod error;
pub mod metrics;
pub mod queue;

pub use error::BufferError;
pub use metrics::QueueMetrics;
pub use queue::{QueueReceiver, SeverityQueue};
