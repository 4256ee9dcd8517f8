//! Error types for loading, probing and persisting

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading the candidate proxy list
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("input file {0} not found")]
    NotFound(PathBuf),

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("input file {0} is empty or has no host:port lines")]
    Empty(PathBuf),
}

/// Reason a single probe was rejected
///
/// The pipeline only cares that a probe failed; the reason is kept for
/// debug logging.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeError {
    #[error("failed to build client: {0}")]
    Client(String),

    #[error("timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("unexpected HTTP status {0}")]
    Status(u16),

    #[error("transport error: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for ProbeError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ProbeError::Timeout
        } else if e.is_connect() {
            ProbeError::Connect(e.to_string())
        } else if e.is_builder() {
            ProbeError::Client(e.to_string())
        } else {
            ProbeError::Transport(e.to_string())
        }
    }
}

/// Errors raised while writing the output files
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize records: {0}")]
    Serialize(#[from] serde_json::Error),
}
