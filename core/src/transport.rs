//! The HTTP seam and the retry policy.
//!
//! The library performs exactly one suspension point per attempt: the
//! round trip behind [`HttpSend`]. Everything else is CPU-bound.

use std::fmt::Debug;
use std::time::Duration;

use bytes::Bytes;

use crate::{Error, Result};

/// HttpSend dispatches one finalized, signed request and returns the raw
/// response.
///
/// Implementations own the connection pool; concurrency control lives
/// inside the client they wrap.
#[async_trait::async_trait]
pub trait HttpSend: Debug + Send + Sync + 'static {
    /// Send http request and return the response.
    async fn http_send(&self, req: http::Request<Bytes>) -> Result<http::Response<Bytes>>;
}

/// NoopHttpSend is a no-op implementation that always returns an error.
///
/// This is used when no HTTP client is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHttpSend;

#[async_trait::async_trait]
impl HttpSend for NoopHttpSend {
    async fn http_send(&self, _req: http::Request<Bytes>) -> Result<http::Response<Bytes>> {
        Err(Error::config_invalid(
            "HTTP sending not supported: no HTTP client configured",
        ))
    }
}

/// Bounded-retry policy with doubling backoff.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub attempts: u32,
    /// Delay before the first retry; doubles on each further retry.
    pub base_delay: Duration,
    /// Upper bound on the backoff delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 5,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            attempts: 1,
            ..Self::default()
        }
    }

    /// The backoff delay before retry number `retry` (zero-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exp = self
            .base_delay
            .saturating_mul(2u32.saturating_pow(retry));
        exp.min(self.max_delay)
    }
}
