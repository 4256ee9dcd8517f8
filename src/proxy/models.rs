//! Proxy data models

use crate::error::ProbeError;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A candidate proxy in `host:port` form
///
/// Only the presence of the `:` separator is checked; the host and port are
/// passed through to the HTTP client untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProxyAddress(String);

impl ProxyAddress {
    /// Get the address as written in the input file
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Get the proxy URL used for both HTTP and HTTPS forwarding
    pub fn url(&self) -> String {
        format!("http://{}", self.0)
    }
}

impl FromStr for ProxyAddress {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err("empty proxy address".to_string());
        }
        if !s.contains(':') {
            return Err(format!("missing ':' separator in {}", s));
        }
        Ok(Self(s.to_string()))
    }
}

impl fmt::Display for ProxyAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of one timed GET through a proxy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    /// Wall-clock time from dispatch to response headers (or failure)
    pub elapsed_ms: u64,
    pub outcome: Result<(), ProbeError>,
}

impl ProbeResult {
    pub fn success(elapsed_ms: u64) -> Self {
        Self {
            elapsed_ms,
            outcome: Ok(()),
        }
    }

    pub fn failure(elapsed_ms: u64, error: ProbeError) -> Self {
        Self {
            elapsed_ms,
            outcome: Err(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Evidence for a proxy that passed every validation step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationRecord {
    pub proxy: ProxyAddress,
    pub liveness_ms: u64,
    pub consistency1_ms: u64,
    pub consistency2_ms: u64,
    pub avg_consistency_ms: u64,
    pub avg_total_ms: u64,
    pub timestamp: DateTime<Local>,
}

impl ValidationRecord {
    /// Build a record from the three probe latencies, deriving the averages
    pub fn new(
        proxy: ProxyAddress,
        liveness_ms: u64,
        consistency1_ms: u64,
        consistency2_ms: u64,
        timestamp: DateTime<Local>,
    ) -> Self {
        Self {
            proxy,
            liveness_ms,
            consistency1_ms,
            consistency2_ms,
            avg_consistency_ms: (consistency1_ms + consistency2_ms) / 2,
            avg_total_ms: (liveness_ms + consistency1_ms + consistency2_ms) / 3,
            timestamp,
        }
    }
}
