//! The DynamoDB facade: target-header JSON RPC over POST.

use cloudcall_core::body::{content_type, EncodeBody};
use cloudcall_core::{Body, Client, Evaluator, Request, ResponseFormat, Result};
use http::header::CONTENT_TYPE;
use http::{HeaderName, HeaderValue, Method};
use log::debug;
use serde::de::DeserializeOwned;

use crate::model::*;

/// Operation names are qualified by this prefix in `X-Amz-Target`.
pub const TARGET_PREFIX: &str = "DynamoDB_20120810";

const X_AMZ_TARGET: HeaderName = HeaderName::from_static("x-amz-target");

/// Statuses retried for this family: DynamoDB is stall-prone, so request
/// timeouts join the usual transient set.
const TRANSIENT: &[u16] = &[408, 500, 503];

/// Client for the DynamoDB service.
#[derive(Debug, Clone)]
pub struct DynamoDb {
    client: Client,
    evaluator: Evaluator,
}

impl DynamoDb {
    /// Wrap a signed-request client in the DynamoDB dialect.
    pub fn new(client: Client) -> Self {
        Self {
            client,
            evaluator: Evaluator::new(ResponseFormat::Json).with_transient(TRANSIENT),
        }
    }

    /// List table names, one page at a time.
    pub async fn list_tables(&self, input: &ListTablesInput) -> Result<ListTablesOutput> {
        self.call("ListTables", input.clone()).await
    }

    /// Write an item, replacing any existing item with the same key.
    pub async fn put_item(&self, input: &PutItemInput) -> Result<PutItemOutput> {
        self.call("PutItem", input.clone()).await
    }

    /// Read one item by primary key.
    pub async fn get_item(&self, input: &GetItemInput) -> Result<GetItemOutput> {
        self.call("GetItem", input.clone()).await
    }

    /// Delete one item by primary key.
    pub async fn delete_item(&self, input: &DeleteItemInput) -> Result<DeleteItemOutput> {
        self.call("DeleteItem", input.clone()).await
    }

    /// One JSON RPC call: POST with `X-Amz-Target` naming the operation
    /// and the input serialized as the body.
    async fn call<I, O>(&self, op: &str, input: I) -> Result<O>
    where
        I: EncodeBody + 'static,
        O: DeserializeOwned,
    {
        let mut req = Request::server(Method::POST, self.client.service().endpoint())?;
        req.header(
            CONTENT_TYPE,
            HeaderValue::from_static(content_type::AMZ_JSON_1_0),
        );
        req.header(
            X_AMZ_TARGET,
            HeaderValue::from_str(&format!("{TARGET_PREFIX}.{op}"))?,
        );
        req.body(Body::Value(Box::new(input)));

        debug!("calling {TARGET_PREFIX}.{op}");
        self.client.send(req, &self.evaluator).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use bytes::Bytes;
    use cloudcall_core::hash::base64_md5;
    use cloudcall_core::sigv4::Signer;
    use cloudcall_core::{Credential, ErrorKind, HttpSend, RetryPolicy, Service};
    use pretty_assertions::assert_eq;

    use super::*;

    #[derive(Debug)]
    struct CannedHttpSend {
        status: u16,
        body: &'static str,
        seen: Mutex<Vec<http::Request<Bytes>>>,
    }

    impl CannedHttpSend {
        fn new(status: u16, body: &'static str) -> Arc<Self> {
            Arc::new(Self {
                status,
                body,
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl HttpSend for CannedHttpSend {
        async fn http_send(&self, req: http::Request<Bytes>) -> Result<http::Response<Bytes>> {
            self.seen.lock().unwrap().push(req);
            Ok(http::Response::builder()
                .status(self.status)
                .body(Bytes::from_static(self.body.as_bytes()))
                .unwrap())
        }
    }

    fn dynamodb(http: Arc<CannedHttpSend>) -> DynamoDb {
        let service = Service::new(
            "dynamodb",
            "us-east-1",
            "https://dynamodb.us-east-1.amazonaws.com",
        )
        .unwrap();
        let signer = Signer::new(service, Credential::new("AKIDEXAMPLE", "secret"));
        DynamoDb::new(Client::with_shared_http(signer, http).with_retry(RetryPolicy::none()))
    }

    #[tokio::test]
    async fn test_list_tables_signs_exact_body() {
        // The signature must cover the exact serialized body; length and
        // MD5 are computed over those same bytes.
        let http = CannedHttpSend::new(200, r#"{"TableNames":["users"]}"#);
        let ddb = dynamodb(Arc::clone(&http));

        let out = ddb
            .list_tables(&ListTablesInput {
                limit: Some(10),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(out.table_names, vec!["users"]);

        let seen = http.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        let req = &seen[0];

        assert_eq!(req.method(), http::Method::POST);
        assert_eq!(&req.body()[..], br#"{"Limit":10}"#);
        assert_eq!(
            req.headers().get("x-amz-target").unwrap(),
            "DynamoDB_20120810.ListTables"
        );
        assert_eq!(
            req.headers().get(CONTENT_TYPE).unwrap(),
            content_type::AMZ_JSON_1_0
        );
        assert_eq!(req.headers().get(http::header::CONTENT_LENGTH).unwrap(), "12");
        assert_eq!(
            req.headers().get("content-md5").unwrap().to_str().unwrap(),
            base64_md5(br#"{"Limit":10}"#)
        );
        assert!(req.headers().contains_key(http::header::AUTHORIZATION));
    }

    #[tokio::test]
    async fn test_get_item_round_trip() {
        let http = CannedHttpSend::new(200, r#"{"Item":{"id":{"S":"u-1"},"age":{"N":"30"}}}"#);
        let ddb = dynamodb(Arc::clone(&http));

        let mut key = Item::new();
        key.insert("id".to_string(), AttributeValue::s("u-1"));
        let out = ddb
            .get_item(&GetItemInput {
                table_name: "users".to_string(),
                key,
                consistent_read: Some(true),
            })
            .await
            .unwrap();

        let item = out.item.unwrap();
        assert_eq!(item["id"], AttributeValue::s("u-1"));
        assert_eq!(item["age"], AttributeValue::n(30));

        let seen = http.seen.lock().unwrap();
        let body: serde_json::Value = serde_json::from_slice(seen[0].body()).unwrap();
        assert_eq!(body["TableName"], "users");
        assert_eq!(body["ConsistentRead"], true);
        assert_eq!(body["Key"]["id"]["S"], "u-1");
    }

    #[tokio::test]
    async fn test_resource_not_found_is_typed() {
        let http = CannedHttpSend::new(
            400,
            r#"{"__type":"com.amazonaws.dynamodb.v20120810#ResourceNotFoundException","message":"Requested resource not found"}"#,
        );
        let ddb = dynamodb(Arc::clone(&http));

        let err = ddb
            .list_tables(&ListTablesInput::default())
            .await
            .expect_err("400 surfaces");
        assert_eq!(err.kind(), ErrorKind::Service);
        assert_eq!(
            err.service_error().unwrap().code,
            "ResourceNotFoundException"
        );
    }

    #[tokio::test]
    async fn test_request_timeout_is_transient() {
        let http = CannedHttpSend::new(408, "");
        let ddb = dynamodb(Arc::clone(&http));

        let err = ddb
            .list_tables(&ListTablesInput::default())
            .await
            .expect_err("no retries configured");
        assert_eq!(err.kind(), ErrorKind::ServiceTransient);
        assert!(err.is_retryable());
    }
}
