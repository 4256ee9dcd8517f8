//! Probe executor: one timed HTTP GET through a proxy

use crate::error::ProbeError;
use crate::proxy::models::{ProbeResult, ProxyAddress};
use async_trait::async_trait;
use reqwest::redirect::Policy;
use reqwest::{Client, Proxy as ReqwestProxy, StatusCode};
use std::time::{Duration, Instant};

/// Issues single GET requests and reports pass/fail with latency
///
/// Implementations hold no state between calls; every probe uses its own
/// connection.
#[async_trait]
pub trait Prober: Send + Sync {
    /// GET `target` through `proxy`, passing only on an exact 200
    async fn probe(
        &self,
        proxy: &ProxyAddress,
        target: &str,
        timeout: Duration,
        forbid_redirects: bool,
    ) -> ProbeResult;

    /// GET `target` directly, without a proxy
    async fn check_direct(&self, target: &str, timeout: Duration) -> Result<(), ProbeError>;
}

/// reqwest-backed prober
#[derive(Debug, Clone)]
pub struct HttpProber {
    user_agent: String,
}

impl HttpProber {
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
        }
    }

    /// Create a reqwest client that forwards both HTTP and HTTPS through the proxy
    fn create_client(
        &self,
        proxy: Option<&ProxyAddress>,
        timeout: Duration,
        forbid_redirects: bool,
    ) -> Result<Client, ProbeError> {
        let mut builder = Client::builder()
            .timeout(timeout)
            .user_agent(&self.user_agent)
            .pool_max_idle_per_host(0);

        builder = match proxy {
            Some(proxy) => builder.proxy(ReqwestProxy::all(proxy.url())?),
            None => builder.no_proxy(),
        };
        if forbid_redirects {
            builder = builder.redirect(Policy::none());
        }

        Ok(builder.build()?)
    }

    async fn send(client: &Client, target: &str, timeout: Duration) -> Result<(), ProbeError> {
        match tokio::time::timeout(timeout, client.get(target).send()).await {
            Ok(Ok(response)) => {
                if response.status() == StatusCode::OK {
                    Ok(())
                } else {
                    Err(ProbeError::Status(response.status().as_u16()))
                }
            }
            Ok(Err(e)) => Err(e.into()),
            Err(_) => Err(ProbeError::Timeout),
        }
    }
}

#[async_trait]
impl Prober for HttpProber {
    async fn probe(
        &self,
        proxy: &ProxyAddress,
        target: &str,
        timeout: Duration,
        forbid_redirects: bool,
    ) -> ProbeResult {
        let start = Instant::now();

        let outcome = match self.create_client(Some(proxy), timeout, forbid_redirects) {
            Ok(client) => Self::send(&client, target, timeout).await,
            Err(e) => Err(e),
        };

        let elapsed_ms = start.elapsed().as_millis() as u64;
        match outcome {
            Ok(()) => ProbeResult::success(elapsed_ms),
            Err(e) => {
                tracing::debug!(proxy = %proxy, url = target, error = %e, "probe failed");
                ProbeResult::failure(elapsed_ms, e)
            }
        }
    }

    async fn check_direct(&self, target: &str, timeout: Duration) -> Result<(), ProbeError> {
        let client = self.create_client(None, timeout, false)?;
        Self::send(&client, target, timeout).await
    }
}
