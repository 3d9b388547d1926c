//! The client core every service facade builds on: finalize, sign, seal,
//! dispatch, evaluate, and retry transient outcomes.

use std::sync::Arc;

use log::debug;
use serde::de::DeserializeOwned;

use crate::param::FromHeaders;
use crate::request::Request;
use crate::response::Evaluator;
use crate::sigv4::Signer;
use crate::transport::{HttpSend, RetryPolicy};
use crate::{Result, Service};

/// A signed-request client for one service endpoint.
///
/// Cheap to clone; safe to share across tasks. Each call holds at most one
/// outstanding HTTP request, and the retry loop is the only place a
/// transient error is absorbed: callers see at most one error per call.
#[derive(Debug, Clone)]
pub struct Client {
    signer: Signer,
    http: Arc<dyn HttpSend>,
    retry: RetryPolicy,
}

impl Client {
    /// Create a client from a signer and a transport.
    pub fn new(signer: Signer, http: impl HttpSend) -> Self {
        Self {
            signer,
            http: Arc::new(http),
            retry: RetryPolicy::default(),
        }
    }

    /// Create a client sharing an existing transport handle.
    pub fn with_shared_http(signer: Signer, http: Arc<dyn HttpSend>) -> Self {
        Self {
            signer,
            http,
            retry: RetryPolicy::default(),
        }
    }

    /// Replace the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// The service this client targets.
    pub fn service(&self) -> &Service {
        self.signer.service()
    }

    /// Sign and dispatch the request, evaluating the response into the
    /// caller's typed result.
    ///
    /// Every attempt is signed afresh, so a retry carries a new timestamp
    /// and signature while replaying the exact same body bytes.
    pub async fn send<T: DeserializeOwned>(
        &self,
        req: Request,
        evaluator: &Evaluator,
    ) -> Result<T> {
        self.dispatch(req, |resp| evaluator.evaluate(resp)).await
    }

    /// Like [`Client::send`], additionally unmarshalling header-carried
    /// response metadata.
    pub async fn send_with_headers<T, H>(
        &self,
        req: Request,
        evaluator: &Evaluator,
    ) -> Result<(T, H)>
    where
        T: DeserializeOwned,
        H: FromHeaders,
    {
        self.dispatch(req, |resp| evaluator.evaluate_with_headers(resp))
            .await
    }

    /// Like [`Client::send`], but hand back the raw response bytes instead
    /// of decoding a document (object downloads).
    pub async fn send_raw<H: FromHeaders>(
        &self,
        req: Request,
        evaluator: &Evaluator,
    ) -> Result<(bytes::Bytes, H)> {
        self.dispatch(req, |resp| evaluator.evaluate_raw(resp)).await
    }

    async fn dispatch<T>(
        &self,
        req: Request,
        evaluate: impl Fn(http::Response<bytes::Bytes>) -> Result<T>,
    ) -> Result<T> {
        // Finalized once: retries replay these exact bytes.
        let template = req.finalize()?;

        let mut retry = 0u32;
        loop {
            if retry > 0 {
                let delay = self.retry.delay_for(retry - 1);
                debug!(
                    "retrying {} {} in {delay:?} (retry {retry}/{})",
                    template.method(),
                    template.path(),
                    self.retry.attempts - 1,
                );
                tokio::time::sleep(delay).await;
            }

            let mut attempt = template.clone();
            self.signer.sign(&mut attempt)?;
            attempt.seal();

            let outcome = match self.http.http_send(attempt.to_http()?).await {
                Ok(resp) => evaluate(resp),
                Err(e) => Err(e),
            };

            match outcome {
                Ok(v) => return Ok(v),
                Err(e) if e.is_retryable() && retry + 1 < self.retry.attempts => {
                    debug!("attempt failed, will retry: {e}");
                    retry += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
