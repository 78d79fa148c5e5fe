//! Domain layer for log-fanout.
//!
//! Contains the canonical types shared across all modules:
//! - `LogEvent`: the immutable event built by the ingestion API
//! - `Level`: event severity (INFO/WARNING/ERROR or a caller-supplied string)
//! - `QueueKind`: which of the five severity queues a payload travels through
//! - `PipelineError`: top-level error type

pub mod error;
pub mod log_event;
pub mod log_level;

pub use error::PipelineError;
pub use log_event::LogEvent;
pub use log_level::{Level, QueueKind};
