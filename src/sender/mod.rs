pub mod stats;
pub mod worker;

pub use stats::{AtomicWorkerStats, WorkerStats};
pub use worker::{Delivery, PublisherWorker, WorkerReport, WorkerState};
