//! S3 client speaking the REST resource dialect.
//!
//! Operations address `/<bucket>/<key>` paths directly; request metadata
//! rides in headers, list and error bodies are XML, and object bodies are
//! raw bytes.

#![warn(missing_docs)]

mod client;
pub use client::S3;

mod model;
pub use model::*;
