//! Bounded worker pool driving the validation pipeline

use crate::engine::report::ConsoleReporter;
use crate::engine::store::ResultStore;
use crate::proxy::checker::ProxyChecker;
use crate::proxy::models::ProxyAddress;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::task::JoinSet;

/// Fixed set of long-lived workers pulling proxies in input order
pub struct WorkerPool {
    checker: ProxyChecker,
    store: Arc<ResultStore>,
    reporter: Option<ConsoleReporter>,
}

impl WorkerPool {
    pub fn new(checker: ProxyChecker, store: Arc<ResultStore>) -> Self {
        Self {
            checker,
            store,
            reporter: None,
        }
    }

    pub fn with_reporter(mut self, reporter: ConsoleReporter) -> Self {
        self.reporter = Some(reporter);
        self
    }

    /// Validate every proxy with at most `concurrency` pipelines in flight
    ///
    /// Proxies are taken in list order; results land in the store in
    /// completion order. Once the stop flag is raised no worker starts
    /// another proxy.
    pub async fn run(&self, proxies: Vec<ProxyAddress>) {
        let queue: Arc<[ProxyAddress]> = proxies.into();
        let next = Arc::new(AtomicUsize::new(0));
        let workers = self.checker.config().concurrency.min(queue.len());

        let mut set = JoinSet::new();
        for worker_id in 0..workers {
            let queue = Arc::clone(&queue);
            let next = Arc::clone(&next);
            let checker = self.checker.clone();
            let store = Arc::clone(&self.store);
            let reporter = self.reporter.clone();

            set.spawn(async move {
                loop {
                    if store.is_stopped() {
                        break;
                    }
                    let index = next.fetch_add(1, Ordering::SeqCst);
                    let Some(proxy) = queue.get(index) else {
                        break;
                    };

                    let result = checker.validate(proxy).await;
                    let checked = store.mark_checked();

                    match result {
                        Some(record) => {
                            let shown = reporter.as_ref().map(|_| record.clone());
                            let passed = store.record(record);
                            if let (Some(reporter), Some(record), Some(passed)) =
                                (&reporter, shown, passed)
                            {
                                reporter.accepted(&record, checked, store.total(), passed);
                            }
                        }
                        None => {
                            if let Some(reporter) = &reporter {
                                reporter.rejected(checked, store.total(), store.len());
                            }
                        }
                    }
                }
                tracing::trace!(worker_id, "worker finished");
            });
        }

        while let Some(joined) = set.join_next().await {
            if let Err(e) = joined {
                tracing::error!(error = %e, "worker task failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::store::OutputPaths;
    use crate::proxy::checker::CheckerConfig;
    use crate::test_support::ScriptedProber;
    use std::time::Duration;

    fn proxies(n: usize) -> Vec<ProxyAddress> {
        (1..=n)
            .map(|i| format!("10.0.0.{}:8080", i).parse().unwrap())
            .collect()
    }

    fn setup(
        prober: Arc<ScriptedProber>,
        concurrency: usize,
        total: usize,
    ) -> (tempfile::TempDir, WorkerPool, Arc<ResultStore>) {
        let dir = tempfile::tempdir().unwrap();
        let paths = OutputPaths::new(dir.path().join("live.txt"), dir.path().join("live.json"));
        let store = Arc::new(ResultStore::new(paths, total));
        let config = CheckerConfig::new()
            .with_concurrency(concurrency)
            .with_pause(Duration::from_millis(1));
        let checker = ProxyChecker::with_prober(config, prober);
        let pool = WorkerPool::new(checker, Arc::clone(&store));
        (dir, pool, store)
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_all_pass_checkpoints_at_five() {
        let prober = Arc::new(ScriptedProber::new());
        let (_dir, pool, store) = setup(prober, 3, 7);

        pool.run(proxies(7)).await;

        assert_eq!(store.checked(), 7);
        assert_eq!(store.len(), 7);
        assert_eq!(store.flush_count(), 1);
    }

    #[tokio::test]
    async fn test_failures_still_count_as_checked() {
        let prober = Arc::new(
            ScriptedProber::new()
                .fail_at("10.0.0.1:8080", 0)
                .fail_at("10.0.0.2:8080", 2),
        );
        let (_dir, pool, store) = setup(prober.clone(), 2, 3);

        pool.run(proxies(3)).await;

        assert_eq!(store.checked(), 3);
        assert_eq!(store.len(), 1);
        assert_eq!(store.records()[0].proxy.as_str(), "10.0.0.3:8080");
        assert_eq!(prober.calls_for("10.0.0.1:8080").len(), 1);
        assert_eq!(prober.calls_for("10.0.0.2:8080").len(), 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrency_bound() {
        let prober = Arc::new(ScriptedProber::new().with_delay(Duration::from_millis(20)));
        let (_dir, pool, store) = setup(prober.clone(), 4, 20);

        pool.run(proxies(20)).await;

        assert_eq!(store.checked(), 20);
        assert!(prober.max_in_flight() <= 4);
        assert!(prober.max_in_flight() > 1);
    }

    #[tokio::test]
    async fn test_stopped_store_skips_all_work() {
        let prober = Arc::new(ScriptedProber::new());
        let (_dir, pool, store) = setup(prober.clone(), 4, 5);
        store.stop();

        pool.run(proxies(5)).await;

        assert_eq!(prober.total_calls(), 0);
        assert_eq!(store.checked(), 0);
    }

    #[tokio::test]
    async fn test_empty_list() {
        let prober = Arc::new(ScriptedProber::new());
        let (_dir, pool, store) = setup(prober, 4, 0);

        pool.run(Vec::new()).await;
        assert_eq!(store.checked(), 0);
    }
}
