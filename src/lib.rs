//! Proxy Sieve - Multi-stage HTTP proxy validator
//!
//! Routes sample requests through each candidate proxy and keeps only the
//! ones that pass a liveness probe and two consistency probes. Accepted
//! proxies are checkpointed to disk while the run is in progress.

pub mod engine;
pub mod error;
pub mod proxy;

#[cfg(test)]
pub(crate) mod test_support;

pub use engine::*;
pub use error::{LoadError, PersistError, ProbeError};
pub use proxy::*;

/// Application result type
pub type Result<T> = anyhow::Result<T>;
