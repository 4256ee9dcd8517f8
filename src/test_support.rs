//! In-memory prober for unit tests

use crate::error::ProbeError;
use crate::proxy::models::{ProbeResult, ProxyAddress};
use crate::proxy::probe::Prober;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ProbeCall {
    pub target: String,
    pub forbid_redirects: bool,
}

/// Prober that answers from a script and records every call
#[derive(Default)]
pub struct ScriptedProber {
    /// Step index (0..3) at which a proxy fails
    failures: HashMap<String, usize>,
    latencies: [u64; 3],
    delay: Duration,
    offline: HashSet<String>,
    calls: Mutex<HashMap<String, Vec<ProbeCall>>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedProber {
    pub fn new() -> Self {
        Self {
            latencies: [10, 20, 30],
            ..Default::default()
        }
    }

    pub fn fail_at(mut self, proxy: &str, step: usize) -> Self {
        self.failures.insert(proxy.to_string(), step);
        self
    }

    pub fn with_latencies(mut self, latencies: [u64; 3]) -> Self {
        self.latencies = latencies;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn offline(mut self, url: &str) -> Self {
        self.offline.insert(url.to_string());
        self
    }

    pub fn calls_for(&self, proxy: &str) -> Vec<ProbeCall> {
        self.calls
            .lock()
            .unwrap()
            .get(proxy)
            .cloned()
            .unwrap_or_default()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().map(Vec::len).sum()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Prober for ScriptedProber {
    async fn probe(
        &self,
        proxy: &ProxyAddress,
        target: &str,
        _timeout: Duration,
        forbid_redirects: bool,
    ) -> ProbeResult {
        let step = {
            let mut calls = self.calls.lock().unwrap();
            let entry = calls.entry(proxy.as_str().to_string()).or_default();
            entry.push(ProbeCall {
                target: target.to_string(),
                forbid_redirects,
            });
            entry.len() - 1
        };

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let elapsed_ms = self.latencies[step.min(2)];
        match self.failures.get(proxy.as_str()) {
            Some(&fail) if fail == step => ProbeResult::failure(elapsed_ms, ProbeError::Timeout),
            _ => ProbeResult::success(elapsed_ms),
        }
    }

    async fn check_direct(&self, target: &str, _timeout: Duration) -> Result<(), ProbeError> {
        if self.offline.contains(target) {
            Err(ProbeError::Connect("offline".to_string()))
        } else {
            Ok(())
        }
    }
}
