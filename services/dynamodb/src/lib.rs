//! DynamoDB client speaking the target-header JSON RPC dialect.
//!
//! Every operation is a POST with `X-Amz-Target: DynamoDB_20120810.<Op>`,
//! `Content-Type: application/x-amz-json-1.0`, and the input serialized
//! as the JSON body.

#![warn(missing_docs)]

mod client;
pub use client::DynamoDb;
pub use client::TARGET_PREFIX;

mod model;
pub use model::*;
