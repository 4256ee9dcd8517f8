//! Proxy module for loading and validating proxies
//!
//! This module provides functionality for:
//! - Loading `host:port` candidates from line-oriented files
//! - Timed HTTP probes routed through a proxy
//! - The three-probe validation pipeline

pub mod checker;
pub mod models;
pub mod parser;
pub mod probe;

pub use checker::{CheckerConfig, Endpoint, ProxyChecker};
pub use models::{ProbeResult, ProxyAddress, ValidationRecord};
pub use parser::ProxyParser;
pub use probe::{HttpProber, Prober};
