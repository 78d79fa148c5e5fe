use thiserror::Error;

/// Top-level error type for the pipeline lifecycle.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(#[from] crate::app::ConfigError),

    #[error("Buffer error: {0}")]
    Buffer(#[from] crate::buffer::BufferError),

    #[error("Broker error: {0}")]
    Broker(#[from] crate::broker::BrokerError),

    #[error("Worker for queue '{queue}' failed: {reason}")]
    WorkerFailed { queue: String, reason: String },

    #[error("Runtime error: {0}")]
    Runtime(String),

    #[error("Shutdown timeout after {timeout_ms}ms")]
    ShutdownTimeout { timeout_ms: u64 },
}
