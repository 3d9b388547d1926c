//! A [`reqwest`]-backed [`HttpSend`] implementation.
//!
//! [`ReqwestHttpSend`] owns a `reqwest::Client` behind an `RwLock` so its
//! pool settings can be changed on a live handle: reconfiguring rebuilds
//! the inner client, in-flight requests finish on the old pool, and later
//! requests pick up the new one.

use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use cloudcall_core::{Error, HttpSend, Result};
use http_body_util::BodyExt;
use log::debug;

/// Connection-pool settings for the underlying `reqwest::Client`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    /// Idle connections kept per host.
    pub max_idle_per_host: usize,
    /// How long to wait for response headers before giving up on an
    /// attempt. Stalled reads surface as retryable transport errors.
    pub response_header_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_idle_per_host: 8,
            response_header_timeout: Duration::from_secs(30),
        }
    }
}

impl PoolConfig {
    fn build(&self) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .pool_max_idle_per_host(self.max_idle_per_host)
            .read_timeout(self.response_header_timeout)
            .build()
            .map_err(|e| {
                Error::config_invalid(format!("building http client: {e}")).with_source(e)
            })
    }
}

/// ReqwestHttpSend sends requests with a shared `reqwest::Client`.
#[derive(Debug)]
pub struct ReqwestHttpSend {
    config: RwLock<PoolConfig>,
    client: RwLock<reqwest::Client>,
}

impl Default for ReqwestHttpSend {
    fn default() -> Self {
        Self::new(PoolConfig::default()).expect("default pool config must build")
    }
}

impl ReqwestHttpSend {
    /// Create a transport with the given pool settings.
    pub fn new(config: PoolConfig) -> Result<Self> {
        Ok(Self {
            client: RwLock::new(config.build()?),
            config: RwLock::new(config),
        })
    }

    /// Create a transport around an existing `reqwest::Client`.
    ///
    /// The client keeps whatever settings it was built with until the
    /// first [`ReqwestHttpSend::reconfigure`] call replaces it.
    pub fn from_client(client: reqwest::Client) -> Self {
        Self {
            config: RwLock::new(PoolConfig::default()),
            client: RwLock::new(client),
        }
    }

    /// The current pool settings.
    pub fn config(&self) -> PoolConfig {
        *self.config.read().expect("pool config lock poisoned")
    }

    /// Swap in new pool settings, rebuilding the inner client.
    pub fn reconfigure(&self, config: PoolConfig) -> Result<()> {
        let client = config.build()?;
        *self.config.write().expect("pool config lock poisoned") = config;
        *self.client.write().expect("http client lock poisoned") = client;
        debug!(
            "http pool reconfigured: max_idle_per_host={}, response_header_timeout={:?}",
            config.max_idle_per_host, config.response_header_timeout
        );
        Ok(())
    }

    fn client(&self) -> reqwest::Client {
        // reqwest::Client is an Arc handle, so cloning out of the lock is
        // cheap and keeps the lock out of the await.
        self.client.read().expect("http client lock poisoned").clone()
    }
}

#[async_trait]
impl HttpSend for ReqwestHttpSend {
    async fn http_send(&self, req: http::Request<Bytes>) -> Result<http::Response<Bytes>> {
        let req = reqwest::Request::try_from(req)
            .map_err(|e| Error::transport_failed(format!("converting request: {e}")).with_source(e))?;

        let resp: http::Response<_> = self
            .client()
            .execute(req)
            .await
            .map_err(|e| Error::transport_failed(e.to_string()).with_source(e))?
            .into();

        let (parts, body) = resp.into_parts();
        let bs = BodyExt::collect(body)
            .await
            .map(|buf| buf.to_bytes())
            .map_err(|e| Error::transport_failed(format!("reading response body: {e}")).with_source(e))?;
        Ok(http::Response::from_parts(parts, bs))
    }
}
