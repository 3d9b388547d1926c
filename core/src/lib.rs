//! Core components for calling AWS-style HTTPS services with signed requests.
//!
//! This crate is the signing-and-transport engine the per-service crates
//! build on. It knows nothing about any service's operation catalog; it
//! provides:
//!
//! - **Credential** and **Service**: the long-term key pair and the
//!   (service, region, endpoint) triple the signer computes scope from.
//! - **Request** / **FinalizedRequest**: the request lifecycle. A request is
//!   mutable while parameters and a body source are filled in, then
//!   finalization fixes the body bytes so signing and retry replay the same
//!   payload. After signing the request is sealed against header mutation.
//! - **param**: the field codec mapping tagged struct fields to and from
//!   flat name/value pairs (dotted sequence indexing, `*` map wildcards)
//!   and header maps.
//! - **body**: the content-type-driven body codec (text, form, XML, JSON
//!   and vendor JSON, raw bytes).
//! - **sigv4**: canonical request construction, key derivation, and the
//!   authorization header.
//! - **transport**: the async [`HttpSend`] seam plus the bounded
//!   exponential-backoff [`RetryPolicy`].
//! - **response**: per-service-family evaluation of responses into typed
//!   results or typed [`ServiceError`]s, with transient classification.
//! - **Client**: the facade core chaining finalize → sign → seal →
//!   dispatch → evaluate, re-signing on every retry.
//!
//! ## Example
//!
//! ```no_run
//! use cloudcall_core::{Client, Credential, Evaluator, Request, ResponseFormat, Service};
//! use cloudcall_core::sigv4::Signer;
//! use cloudcall_core::transport::NoopHttpSend;
//! use http::Method;
//!
//! # async fn example() -> cloudcall_core::Result<()> {
//! let service = Service::new("logs", "us-east-1", "https://logs.us-east-1.amazonaws.com")?;
//! let credential = Credential::from_env("ACCESS_KEY_ID", "SECRET_ACCESS_KEY")?;
//! let client = Client::new(Signer::new(service, credential), NoopHttpSend);
//!
//! let mut req = Request::client(Method::GET, client.service().endpoint())?;
//! req.query_pair("Action", "DescribeLogGroups");
//! req.query_pair("Version", "2014-03-28");
//!
//! let groups: serde_json::Value = client
//!     .send(req, &Evaluator::new(ResponseFormat::Xml))
//!     .await?;
//! # Ok(())
//! # }
//! ```

// Make sure all our public APIs have docs.
#![warn(missing_docs)]

pub mod body;
pub mod hash;
pub mod param;
pub mod sigv4;
pub mod time;
pub mod transport;
pub mod utils;

mod constants;

mod error;
pub use error::{Error, ErrorKind, Result, ServiceError, ServiceErrorKind};
mod credential;
pub use credential::Credential;
mod service;
pub use service::{Service, DEFAULT_REGION, REGION_ENV_VAR};
mod request;
pub use request::{Body, FinalizedRequest, Request, MAX_REPLAY_BODY};
mod response;
pub use response::{Evaluator, ResponseFormat};
mod client;
pub use client::Client;
pub use transport::{HttpSend, RetryPolicy};
