//! Serverless lip-sync job handler.
//!
//! One job per invocation, processed strictly sequentially:
//! download → reconcile → infer → upload → cleanup. Any failure is wrapped
//! into a job-level error and reported to the queue; no retries, no partial
//! results.

pub mod config;
pub mod error;
pub mod handler;
pub mod queue;

pub use config::WorkerConfig;
pub use error::{WorkerError, WorkerResult};
pub use handler::JobHandler;
pub use queue::{QueueClient, QueueJob};
