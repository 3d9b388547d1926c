//! Auto Scaling client speaking the query-parameter RPC dialect.
//!
//! Every operation is a GET whose query string carries `Action`, `Version`
//! and the input's fields; responses are XML documents.

#![warn(missing_docs)]

mod client;
pub use client::AutoScaling;
pub use client::API_VERSION;

mod model;
pub use model::*;
