//! The S3 facade: REST resource URLs with header-carried metadata.

use bytes::Bytes;
use cloudcall_core::param::{HeaderWriter, ToHeaders};
use cloudcall_core::{Body, Client, Evaluator, Request, ResponseFormat, Result};
use http::header::CONTENT_TYPE;
use http::{HeaderValue, Method};
use log::debug;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::model::*;

/// RFC 3986 set for path segments; `/` separates them and stays literal.
const PATH_ENCODE_SET: AsciiSet = NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

fn bucket_path(bucket: &str) -> String {
    format!("/{}", utf8_percent_encode(bucket, &PATH_ENCODE_SET))
}

fn object_path(bucket: &str, key: &str) -> String {
    format!(
        "/{}/{}",
        utf8_percent_encode(bucket, &PATH_ENCODE_SET),
        utf8_percent_encode(key, &PATH_ENCODE_SET)
    )
}

fn render_headers<T: ToHeaders>(req: &mut Request, value: &T) -> Result<()> {
    let mut w = HeaderWriter::new();
    value.to_headers(&mut w)?;
    req.headers(w.into_headers());
    Ok(())
}

/// Client for the S3 service.
#[derive(Debug, Clone)]
pub struct S3 {
    client: Client,
    xml: Evaluator,
    empty: Evaluator,
}

impl S3 {
    /// Wrap a signed-request client in the S3 dialect.
    pub fn new(client: Client) -> Self {
        Self {
            client,
            xml: Evaluator::new(ResponseFormat::Xml),
            empty: Evaluator::new(ResponseFormat::Empty),
        }
    }

    /// Create a bucket.
    pub async fn create_bucket(&self, input: &CreateBucketInput) -> Result<()> {
        let mut req = Request::server(Method::PUT, self.client.service().endpoint())?;
        req = req.with_path(bucket_path(&input.bucket));
        render_headers(&mut req, input)?;

        debug!("creating bucket {}", input.bucket);
        self.client.send(req, &self.empty).await
    }

    /// Delete an empty bucket.
    pub async fn delete_bucket(&self, bucket: &str) -> Result<()> {
        let req = Request::client(Method::DELETE, self.client.service().endpoint())?
            .with_path(bucket_path(bucket));
        self.client.send(req, &self.empty).await
    }

    /// List a bucket's objects, one page at a time.
    pub async fn list_bucket(&self, input: &ListBucketInput) -> Result<ListBucketResult> {
        let mut req = Request::client(Method::GET, self.client.service().endpoint())?
            .with_path(bucket_path(&input.bucket));
        req.query_value(input);
        self.client.send(req, &self.xml).await
    }

    /// Store an object, replacing any existing object under the key.
    pub async fn put_object(&self, input: &PutObjectInput) -> Result<PutObjectOutput> {
        let mut req = Request::server(Method::PUT, self.client.service().endpoint())?
            .with_path(object_path(&input.bucket, &input.key));
        if let Some(ct) = &input.content_type {
            req.header(CONTENT_TYPE, HeaderValue::from_str(ct)?);
        }
        render_headers(&mut req, input)?;
        req.body(Body::Bytes(input.body.clone()));

        debug!(
            "putting {} bytes to {}/{}",
            input.body.len(),
            input.bucket,
            input.key,
        );
        let ((), out) = self.client.send_with_headers(req, &self.empty).await?;
        Ok(out)
    }

    /// Read an object's bytes and metadata.
    pub async fn get_object(&self, input: &GetObjectInput) -> Result<(Bytes, ObjectMetadata)> {
        let mut req = Request::client(Method::GET, self.client.service().endpoint())?
            .with_path(object_path(&input.bucket, &input.key));
        render_headers(&mut req, input)?;
        self.client.send_raw(req, &self.empty).await
    }

    /// Read an object's metadata without its bytes.
    pub async fn head_object(&self, bucket: &str, key: &str) -> Result<ObjectMetadata> {
        let req = Request::client(Method::HEAD, self.client.service().endpoint())?
            .with_path(object_path(bucket, key));
        let ((), meta) = self.client.send_with_headers(req, &self.empty).await?;
        Ok(meta)
    }

    /// Delete an object.
    pub async fn delete_object(&self, bucket: &str, key: &str) -> Result<()> {
        let req = Request::client(Method::DELETE, self.client.service().endpoint())?
            .with_path(object_path(bucket, key));
        self.client.send(req, &self.empty).await
    }
}
