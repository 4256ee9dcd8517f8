//! Proxy checker module running the multi-step validation protocol

use crate::proxy::models::{ProxyAddress, ValidationRecord};
use crate::proxy::probe::{HttpProber, Prober};
use chrono::Local;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Default timeout for each probe in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Default number of concurrent validations
pub const DEFAULT_CONCURRENCY: usize = 100;

/// Default pause between the two consistency probes in milliseconds
pub const DEFAULT_PAUSE_MS: u64 = 200;

/// Default user agent sent with every probe
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Default liveness endpoint
pub const DEFAULT_LIVENESS_URL: &str = "http://httpbin.org/ip";

/// Default consistency endpoint
pub const DEFAULT_CONSISTENCY_URL: &str = "https://c3.dstatbot.win";

/// A validation target and its per-endpoint metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Short display name
    pub name: String,
    pub url: String,
    /// Timeout for each probe against this endpoint
    pub timeout: Duration,
    /// Number of probes the protocol sends to this endpoint
    pub attempts: u32,
}

impl Endpoint {
    pub fn new(name: &str, url: &str, timeout: Duration, attempts: u32) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            timeout,
            attempts,
        }
    }

    pub fn with_url(mut self, url: String) -> Self {
        self.url = url;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn liveness() -> Self {
        Self::new(
            "HTTPBIN",
            DEFAULT_LIVENESS_URL,
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            1,
        )
    }

    pub fn consistency() -> Self {
        Self::new(
            "DSTATBOT",
            DEFAULT_CONSISTENCY_URL,
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            2,
        )
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}x ({})", self.name, self.attempts, self.url)
    }
}

/// Configuration for proxy checker
#[derive(Debug, Clone)]
pub struct CheckerConfig {
    /// Number of concurrent validations
    pub concurrency: usize,
    /// Pause between the two consistency probes
    pub pause: Duration,
    /// User agent header applied to every probe
    pub user_agent: String,
    /// First-stage endpoint, probed once
    pub liveness: Endpoint,
    /// Second-stage endpoint, probed twice with redirects forbidden
    pub consistency: Endpoint,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            pause: Duration::from_millis(DEFAULT_PAUSE_MS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            liveness: Endpoint::liveness(),
            consistency: Endpoint::consistency(),
        }
    }
}

impl CheckerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_pause(mut self, pause: Duration) -> Self {
        self.pause = pause;
        self
    }

    pub fn with_user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = user_agent;
        self
    }

    /// Apply the same probe timeout to both endpoints
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.liveness.timeout = timeout;
        self.consistency.timeout = timeout;
        self
    }

    pub fn with_liveness(mut self, endpoint: Endpoint) -> Self {
        self.liveness = endpoint;
        self
    }

    pub fn with_consistency(mut self, endpoint: Endpoint) -> Self {
        self.consistency = endpoint;
        self
    }

    pub fn endpoints(&self) -> [&Endpoint; 2] {
        [&self.liveness, &self.consistency]
    }
}

/// Proxy checker running the validation pipeline for one proxy at a time
#[derive(Clone)]
pub struct ProxyChecker {
    config: CheckerConfig,
    prober: Arc<dyn Prober>,
}

impl ProxyChecker {
    /// Create a new proxy checker with default configuration
    pub fn new() -> Self {
        Self::with_config(CheckerConfig::default())
    }

    /// Create a new proxy checker backed by reqwest
    pub fn with_config(config: CheckerConfig) -> Self {
        let prober = Arc::new(HttpProber::new(config.user_agent.clone()));
        Self::with_prober(config, prober)
    }

    /// Create a new proxy checker with a custom probe executor
    pub fn with_prober(config: CheckerConfig, prober: Arc<dyn Prober>) -> Self {
        Self { config, prober }
    }

    pub fn config(&self) -> &CheckerConfig {
        &self.config
    }

    pub fn prober(&self) -> &Arc<dyn Prober> {
        &self.prober
    }

    /// Validate a single proxy
    ///
    /// Runs one liveness probe followed by two consistency probes separated
    /// by the configured pause. The first failing probe rejects the proxy and
    /// no later probe is sent.
    pub async fn validate(&self, proxy: &ProxyAddress) -> Option<ValidationRecord> {
        let liveness_ms = self.step(proxy, &self.config.liveness, false).await?;
        let consistency1_ms = self.step(proxy, &self.config.consistency, true).await?;

        tokio::time::sleep(self.config.pause).await;

        let consistency2_ms = self.step(proxy, &self.config.consistency, true).await?;

        Some(ValidationRecord::new(
            proxy.clone(),
            liveness_ms,
            consistency1_ms,
            consistency2_ms,
            Local::now(),
        ))
    }

    async fn step(
        &self,
        proxy: &ProxyAddress,
        endpoint: &Endpoint,
        forbid_redirects: bool,
    ) -> Option<u64> {
        let result = self
            .prober
            .probe(proxy, &endpoint.url, endpoint.timeout, forbid_redirects)
            .await;
        result.is_success().then_some(result.elapsed_ms)
    }
}

impl Default for ProxyChecker {
    fn default() -> Self {
        Self::new()
    }
}
