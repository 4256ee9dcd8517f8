//! Shared run state and the checkpointed result accumulator

use crate::error::PersistError;
use crate::proxy::models::ValidationRecord;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Number of accepted proxies between automatic checkpoints
pub const CHECKPOINT_EVERY: usize = 5;

/// Default plain list output
pub const DEFAULT_PLAIN_OUTPUT: &str = "proxy_live.txt";

/// Default structured output
pub const DEFAULT_JSON_OUTPUT: &str = "proxy_live.json";

/// Destinations rewritten on every flush
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    /// One `host:port` per line
    pub plain: PathBuf,
    /// JSON array of validation records
    pub json: PathBuf,
}

impl Default for OutputPaths {
    fn default() -> Self {
        Self {
            plain: PathBuf::from(DEFAULT_PLAIN_OUTPUT),
            json: PathBuf::from(DEFAULT_JSON_OUTPUT),
        }
    }
}

impl OutputPaths {
    pub fn new(plain: impl Into<PathBuf>, json: impl Into<PathBuf>) -> Self {
        Self {
            plain: plain.into(),
            json: json.into(),
        }
    }
}

/// Process-wide state for one run
///
/// Holds the accepted records, the checked counter and the one-way stop
/// flag. Shared between workers behind an `Arc`.
pub struct ResultStore {
    records: Mutex<Vec<ValidationRecord>>,
    /// Serializes flushes so file writes never interleave
    write_lock: Mutex<()>,
    paths: OutputPaths,
    total: usize,
    checked: AtomicUsize,
    stopped: AtomicBool,
    flushes: AtomicUsize,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ResultStore {
    pub fn new(paths: OutputPaths, total: usize) -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            write_lock: Mutex::new(()),
            paths,
            total,
            checked: AtomicUsize::new(0),
            stopped: AtomicBool::new(false),
            flushes: AtomicUsize::new(0),
        }
    }

    pub fn paths(&self) -> &OutputPaths {
        &self.paths
    }

    /// Append an accepted proxy, checkpointing every [`CHECKPOINT_EVERY`] records
    ///
    /// Returns the number of records accumulated so far, or `None` when the
    /// run has already stopped and the record was dropped. A failed
    /// checkpoint is logged and the record stays in memory for the next flush.
    pub fn record(&self, record: ValidationRecord) -> Option<usize> {
        let count = {
            let mut records = lock(&self.records);
            // Checked under the lock so nothing lands after the final flush.
            if self.is_stopped() {
                tracing::debug!(proxy = %record.proxy, "run stopped, dropping record");
                return None;
            }
            records.push(record);
            records.len()
        };

        if count % CHECKPOINT_EVERY == 0 {
            match self.flush() {
                Ok(()) => tracing::debug!(count, "checkpoint written"),
                Err(e) => tracing::error!(count, error = %e, "checkpoint failed"),
            }
        }
        Some(count)
    }

    /// Rewrite both outputs from the current records
    ///
    /// Each file is written to a sibling temporary file and renamed into
    /// place, so readers see either the previous or the new full contents.
    pub fn flush(&self) -> Result<(), PersistError> {
        let _guard = lock(&self.write_lock);
        let snapshot = self.records();

        let plain: String = snapshot
            .iter()
            .map(|r| format!("{}\n", r.proxy))
            .collect();
        let json = serde_json::to_string_pretty(&snapshot)?;

        write_atomic(&self.paths.plain, plain.as_bytes())?;
        write_atomic(&self.paths.json, json.as_bytes())?;

        self.flushes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    /// Count one finished proxy, accepted or rejected
    pub fn mark_checked(&self) -> usize {
        let checked = self.checked.fetch_add(1, Ordering::SeqCst) + 1;
        debug_assert!(checked <= self.total, "checked more proxies than loaded");
        checked
    }

    /// Raise the stop flag; returns `true` only for the call that raised it
    pub fn stop(&self) -> bool {
        !self.stopped.swap(true, Ordering::SeqCst)
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    pub fn checked(&self) -> usize {
        self.checked.load(Ordering::SeqCst)
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn len(&self) -> usize {
        lock(&self.records).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of completed flushes
    pub fn flush_count(&self) -> usize {
        self.flushes.load(Ordering::SeqCst)
    }

    /// Copy of the accepted records in completion order
    pub fn records(&self) -> Vec<ValidationRecord> {
        lock(&self.records).clone()
    }
}

fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), PersistError> {
    let io_err = |source| PersistError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);

    fs::write(&tmp, contents).map_err(io_err)?;
    fs::rename(&tmp, path).map_err(io_err)
}
