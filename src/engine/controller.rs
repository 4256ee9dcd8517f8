//! Run controller: load, precheck, validate, persist and report

use crate::engine::pool::WorkerPool;
use crate::engine::report::{ConsoleReporter, Summary, DEFAULT_PROGRESS_EVERY};
use crate::engine::shutdown;
use crate::engine::store::{OutputPaths, ResultStore};
use crate::error::LoadError;
use crate::proxy::checker::{CheckerConfig, ProxyChecker};
use crate::proxy::parser::ProxyParser;
use anyhow::Context;
use futures::future::join_all;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default input file
pub const DEFAULT_INPUT: &str = "proxy.txt";

/// Timeout for the direct endpoint reachability check
pub const DEFAULT_PRECHECK_TIMEOUT_SECS: u64 = 3;

/// Settings for one run, fixed at startup
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub input: PathBuf,
    pub checker: CheckerConfig,
    pub outputs: OutputPaths,
    /// Skip the direct reachability check when `None`
    pub precheck_timeout: Option<Duration>,
    pub progress_every: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from(DEFAULT_INPUT),
            checker: CheckerConfig::default(),
            outputs: OutputPaths::default(),
            precheck_timeout: Some(Duration::from_secs(DEFAULT_PRECHECK_TIMEOUT_SECS)),
            progress_every: DEFAULT_PROGRESS_EVERY,
        }
    }
}

impl RunConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_input(mut self, input: PathBuf) -> Self {
        self.input = input;
        self
    }

    pub fn with_checker(mut self, checker: CheckerConfig) -> Self {
        self.checker = checker;
        self
    }

    pub fn with_outputs(mut self, outputs: OutputPaths) -> Self {
        self.outputs = outputs;
        self
    }

    pub fn with_precheck_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.precheck_timeout = timeout;
        self
    }

    pub fn with_progress_every(mut self, every: usize) -> Self {
        self.progress_every = every;
        self
    }
}

/// How a run ended
#[derive(Debug, Clone)]
pub enum RunOutcome {
    Completed(Summary),
    Interrupted(Summary),
}

impl RunOutcome {
    pub fn summary(&self) -> &Summary {
        match self {
            RunOutcome::Completed(s) | RunOutcome::Interrupted(s) => s,
        }
    }

    pub fn is_interrupted(&self) -> bool {
        matches!(self, RunOutcome::Interrupted(_))
    }
}

/// Orchestrates one validation run
pub struct RunController {
    config: RunConfig,
    checker: ProxyChecker,
    reporter: ConsoleReporter,
}

impl RunController {
    pub fn new(config: RunConfig) -> Self {
        let checker = ProxyChecker::with_config(config.checker.clone());
        Self::with_checker(config, checker)
    }

    pub fn with_checker(config: RunConfig, checker: ProxyChecker) -> Self {
        let reporter = ConsoleReporter::new(config.progress_every);
        Self {
            config,
            checker,
            reporter,
        }
    }

    /// Run until every proxy is checked or a termination signal arrives
    pub async fn run(&self) -> Result<RunOutcome, LoadError> {
        self.run_until(shutdown::wait_for_signal()).await
    }

    /// Like [`run`](Self::run), for the binary edge
    ///
    /// A missing or empty input file is reported and yields `Ok(None)`.
    /// Any other failure is returned.
    pub async fn execute(&self) -> crate::Result<Option<RunOutcome>> {
        self.execute_until(shutdown::wait_for_signal()).await
    }

    pub async fn execute_until<F>(&self, interrupt: F) -> crate::Result<Option<RunOutcome>>
    where
        F: Future<Output = ()>,
    {
        match self.run_until(interrupt).await {
            Ok(outcome) => Ok(Some(outcome)),
            Err(e @ (LoadError::NotFound(_) | LoadError::Empty(_))) => {
                tracing::warn!(error = %e, "nothing to check");
                self.reporter.input_unusable(&e);
                Ok(None)
            }
            Err(e) => Err(e).with_context(|| {
                format!("failed to load proxies from {}", self.config.input.display())
            }),
        }
    }

    /// Run until every proxy is checked or `interrupt` resolves
    ///
    /// Input errors are returned before any output file is touched.
    pub async fn run_until<F>(&self, interrupt: F) -> Result<RunOutcome, LoadError>
    where
        F: Future<Output = ()>,
    {
        let proxies = ProxyParser::load_file(&self.config.input)?;
        let total = proxies.len();
        tracing::info!(total, input = %self.config.input.display(), "loaded proxies");

        self.reporter
            .banner(&self.config.input, total, self.checker.config(), &self.config.outputs);

        if let Some(timeout) = self.config.precheck_timeout {
            self.precheck(timeout).await;
        }

        let store = Arc::new(ResultStore::new(self.config.outputs.clone(), total));
        self.flush(&store, "reset outputs");

        let start = Instant::now();
        let pool = WorkerPool::new(self.checker.clone(), Arc::clone(&store))
            .with_reporter(self.reporter.clone());

        let interrupted = tokio::select! {
            _ = pool.run(proxies) => false,
            _ = interrupt => true,
        };
        store.stop();
        let elapsed = start.elapsed();

        self.flush(&store, "final flush");

        let summary = Summary::new(&store.records(), total, store.checked(), elapsed)
            .with_flushes(store.flush_count());
        if interrupted {
            tracing::warn!(passed = summary.passed, "run interrupted");
            self.reporter.interrupted(&summary, &self.config.outputs);
            Ok(RunOutcome::Interrupted(summary))
        } else {
            self.reporter.summary(&summary, &self.config.outputs);
            Ok(RunOutcome::Completed(summary))
        }
    }

    /// Probe both endpoints directly; returns how many answered 200
    ///
    /// The result is advisory: the run proceeds either way.
    pub async fn precheck(&self, timeout: Duration) -> usize {
        let endpoints = self.checker.config().endpoints();
        let prober = self.checker.prober();

        let results = join_all(
            endpoints
                .iter()
                .map(|endpoint| prober.check_direct(&endpoint.url, timeout)),
        )
        .await;

        let mut online = 0;
        for (endpoint, status) in endpoints.iter().zip(&results) {
            self.reporter.endpoint_status(endpoint, status);
            match status {
                Ok(()) => online += 1,
                Err(e) => {
                    tracing::warn!(endpoint = %endpoint.url, error = %e, "endpoint unreachable")
                }
            }
        }

        self.reporter.precheck_result(online, endpoints.len());
        online
    }

    fn flush(&self, store: &ResultStore, stage: &str) {
        if let Err(e) = store.flush() {
            tracing::error!(stage, error = %e, "failed to write outputs");
        }
    }
}
