#![deny(rust_2024_compatibility)]
// Specific pedantic lints enforced (not blanket allow):
#![deny(
    clippy::explicit_iter_loop,
    clippy::manual_let_else,
    clippy::semicolon_if_nothing_returned,
    clippy::inconsistent_struct_constructor
)]
// Noisy pedantic lints suppressed with justification:
#![allow(
    clippy::cast_possible_truncation, // Durations and counters stay far below the limits
    clippy::cast_possible_wrap,       // Counters exported as i64 gauges
    clippy::cast_precision_loss,      // Acceptable for fill ratios
    clippy::missing_errors_doc,       // Internal API
    clippy::module_name_repetitions,  // e.g. BrokerError in broker module
    clippy::must_use_candidate        // Annotated selectively on critical APIs
)]

pub mod app;
pub mod broker;
pub mod buffer;
pub mod domain;
pub mod pipeline;
pub mod reliability;
pub mod sender;

// Re-export main types for easy access
pub use app::{App, Config};
pub use broker::{Broker, BrokerError, MemoryBroker, connect_broker};
pub use domain::{Level, LogEvent, PipelineError, QueueKind};
pub use pipeline::{
    EventLogger, LogPipeline, PipelineConfig, PipelineHandle, PipelineStats, ShutdownReport,
};
pub use reliability::FallbackSink;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
