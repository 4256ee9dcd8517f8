//! Validation engine
//!
//! This module provides:
//! - A bounded worker pool running the validation pipeline per proxy
//! - A shared result store with checkpointed persistence
//! - Interrupt handling that stops dispatch and forces a final flush
//! - The run controller and summary reporting

pub mod controller;
pub mod pool;
pub mod report;
pub mod shutdown;
pub mod store;

pub use controller::{RunConfig, RunController, RunOutcome};
pub use pool::WorkerPool;
pub use report::{ConsoleReporter, Summary};
pub use store::{OutputPaths, ResultStore};
