//! Request and response shapes for the S3 REST API.
//!
//! Request metadata rides in headers (canned ACL, user metadata under the
//! `x-amz-meta-` prefix, encryption and conditional headers); list and
//! error bodies are XML.

use std::collections::BTreeMap;

use bytes::Bytes;
use cloudcall_core::param::{
    FromHeaders, HeaderReader, HeaderWriter, ParamWriter, Tag, ToHeaders, ToParams,
};
use cloudcall_core::Result;
use serde::Deserialize;

/// Canned ACL identifiers, reproduced verbatim at the wire boundary.
pub mod acl {
    /// Owner gets full control, nobody else gets access.
    pub const PRIVATE: &str = "private";
    /// Anyone may read.
    pub const PUBLIC_READ: &str = "public-read";
    /// Anyone may read or write.
    pub const PUBLIC_READ_WRITE: &str = "public-read-write";
    /// Any authenticated user may read.
    pub const AUTHENTICATED_READ: &str = "authenticated-read";
    /// The bucket owner may read the object.
    pub const BUCKET_OWNER_READ: &str = "bucket-owner-read";
    /// The bucket owner gets full control of the object.
    pub const BUCKET_OWNER_FULL_CONTROL: &str = "bucket-owner-full-control";
}

const X_AMZ_ACL: Tag = Tag::named("X-Amz-Acl");
const X_AMZ_META: Tag = Tag::named("X-Amz-Meta-*");
const X_AMZ_SSE: Tag = Tag::named("X-Amz-Server-Side-Encryption");

/// Input for `CreateBucket`.
#[derive(Debug, Clone, Default)]
pub struct CreateBucketInput {
    /// Name of the bucket to create.
    pub bucket: String,
    /// Canned ACL applied at creation, one of [`acl`].
    pub acl: Option<String>,
}

impl ToHeaders for CreateBucketInput {
    fn to_headers(&self, w: &mut HeaderWriter) -> Result<()> {
        w.write_opt_str(&X_AMZ_ACL, self.acl.as_deref())
    }
}

/// Input for `ListBucket`.
#[derive(Debug, Clone, Default)]
pub struct ListBucketInput {
    /// Bucket to list.
    pub bucket: String,
    /// Limit the listing to keys under this prefix.
    pub prefix: Option<String>,
    /// Start listing after this key.
    pub marker: Option<String>,
    /// Collapse keys sharing a prefix up to this delimiter.
    pub delimiter: Option<String>,
    /// Page size.
    pub max_keys: Option<i64>,
}

impl ToParams for ListBucketInput {
    fn to_params(&self, w: &mut ParamWriter) {
        w.write_opt_str(&Tag::named("prefix"), self.prefix.as_deref());
        w.write_opt_str(&Tag::named("marker"), self.marker.as_deref());
        w.write_opt_str(&Tag::named("delimiter"), self.delimiter.as_deref());
        w.write_opt_i64(&Tag::named("max-keys"), self.max_keys);
    }
}

/// Input for `PutObject`.
#[derive(Debug, Clone, Default)]
pub struct PutObjectInput {
    /// Target bucket.
    pub bucket: String,
    /// Object key.
    pub key: String,
    /// The object bytes.
    pub body: Bytes,
    /// Content type stored with the object.
    pub content_type: Option<String>,
    /// Canned ACL, one of [`acl`].
    pub acl: Option<String>,
    /// Server-side encryption algorithm, e.g. `AES256`.
    pub server_side_encryption: Option<String>,
    /// User metadata, stored under the `x-amz-meta-` header prefix.
    pub metadata: BTreeMap<String, String>,
}

impl ToHeaders for PutObjectInput {
    fn to_headers(&self, w: &mut HeaderWriter) -> Result<()> {
        w.write_opt_str(&X_AMZ_ACL, self.acl.as_deref())?;
        w.write_opt_str(&X_AMZ_SSE, self.server_side_encryption.as_deref())?;
        w.write_map(&X_AMZ_META, &self.metadata)
    }
}

/// Header-carried result of `PutObject`.
#[derive(Debug, Clone, Default)]
pub struct PutObjectOutput {
    /// Entity tag of the stored object.
    pub etag: Option<String>,
    /// Encryption algorithm the service applied.
    pub server_side_encryption: Option<String>,
}

impl FromHeaders for PutObjectOutput {
    fn from_headers(r: &HeaderReader<'_>) -> Result<Self> {
        Ok(Self {
            etag: r.read_opt_str(&Tag::named("ETag"))?,
            server_side_encryption: r.read_opt_str(&X_AMZ_SSE)?,
        })
    }
}

/// Input for `GetObject`.
#[derive(Debug, Clone, Default)]
pub struct GetObjectInput {
    /// Source bucket.
    pub bucket: String,
    /// Object key.
    pub key: String,
    /// Fail with a conflict unless the stored entity tag matches.
    pub if_match: Option<String>,
    /// Byte range to read, e.g. `bytes=0-1023`.
    pub range: Option<String>,
}

impl ToHeaders for GetObjectInput {
    fn to_headers(&self, w: &mut HeaderWriter) -> Result<()> {
        w.write_opt_str(&Tag::named("If-Match"), self.if_match.as_deref())?;
        w.write_opt_str(&Tag::named("Range"), self.range.as_deref())
    }
}

/// Header-carried object metadata, from `GetObject` or `HeadObject`.
#[derive(Debug, Clone, Default)]
pub struct ObjectMetadata {
    /// Stored content type.
    pub content_type: Option<String>,
    /// Object size in bytes.
    pub content_length: Option<i64>,
    /// Entity tag.
    pub etag: Option<String>,
    /// Last modification time, as the service formatted it.
    pub last_modified: Option<String>,
    /// Encryption algorithm the object is stored under.
    pub server_side_encryption: Option<String>,
    /// User metadata stored under the `x-amz-meta-` prefix.
    pub metadata: BTreeMap<String, String>,
}

impl FromHeaders for ObjectMetadata {
    fn from_headers(r: &HeaderReader<'_>) -> Result<Self> {
        Ok(Self {
            content_type: r.read_opt_str(&Tag::named("Content-Type"))?,
            content_length: r.read_opt_i64(&Tag::named("Content-Length"))?,
            etag: r.read_opt_str(&Tag::named("ETag"))?,
            last_modified: r.read_opt_str(&Tag::named("Last-Modified"))?,
            server_side_encryption: r.read_opt_str(&X_AMZ_SSE)?,
            metadata: r.read_map(&X_AMZ_META),
        })
    }
}

/// XML listing of a bucket's contents.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListBucketResult {
    /// The listed bucket.
    #[serde(rename = "Name", default)]
    pub name: String,
    /// Prefix the listing was limited to.
    #[serde(rename = "Prefix", default)]
    pub prefix: String,
    /// Whether the listing was cut short by `max-keys`.
    #[serde(rename = "IsTruncated", default)]
    pub is_truncated: bool,
    /// The listed objects.
    #[serde(rename = "Contents", default)]
    pub contents: Vec<ObjectSummary>,
}

/// One object in a bucket listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ObjectSummary {
    /// Object key.
    #[serde(rename = "Key", default)]
    pub key: String,
    /// Last modification time, as the service formatted it.
    #[serde(rename = "LastModified", default)]
    pub last_modified: String,
    /// Entity tag.
    #[serde(rename = "ETag", default)]
    pub etag: String,
    /// Object size in bytes.
    #[serde(rename = "Size", default)]
    pub size: i64,
    /// Storage class identifier.
    #[serde(rename = "StorageClass", default)]
    pub storage_class: String,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_put_object_metadata_headers() {
        // Metadata {"foo":"1","bar":"2"} renders as two distinct
        // x-amz-meta-* headers.
        let mut metadata = BTreeMap::new();
        metadata.insert("foo".to_string(), "1".to_string());
        metadata.insert("bar".to_string(), "2".to_string());
        let input = PutObjectInput {
            bucket: "b".to_string(),
            key: "k".to_string(),
            acl: Some(acl::PUBLIC_READ.to_string()),
            metadata,
            ..Default::default()
        };

        let mut w = HeaderWriter::new();
        input.to_headers(&mut w).unwrap();
        let headers = w.into_headers();

        assert_eq!(headers.get("x-amz-meta-foo").unwrap(), "1");
        assert_eq!(headers.get("x-amz-meta-bar").unwrap(), "2");
        assert_eq!(headers.get("x-amz-acl").unwrap(), "public-read");
        assert!(!headers.contains_key("x-amz-server-side-encryption"));
    }

    #[test]
    fn test_list_bucket_result_decodes() {
        let xml = r#"
            <ListBucketResult>
              <Name>logs</Name>
              <Prefix>2026/</Prefix>
              <IsTruncated>false</IsTruncated>
              <Contents>
                <Key>2026/08/29.log</Key>
                <ETag>"9b2cf535f27731c974343645a3985328"</ETag>
                <Size>2048</Size>
                <StorageClass>STANDARD</StorageClass>
              </Contents>
              <Contents>
                <Key>2026/08/30.log</Key>
                <Size>0</Size>
              </Contents>
            </ListBucketResult>"#;

        let result: ListBucketResult = cloudcall_core::body::decode_xml(xml.as_bytes()).unwrap();
        assert_eq!(result.name, "logs");
        assert!(!result.is_truncated);
        assert_eq!(result.contents.len(), 2);
        assert_eq!(result.contents[0].key, "2026/08/29.log");
        assert_eq!(result.contents[0].size, 2048);
    }

    #[test]
    fn test_object_metadata_from_headers() {
        let mut headers = http::HeaderMap::new();
        headers.insert("content-type", "text/plain".parse().unwrap());
        headers.insert("content-length", "11".parse().unwrap());
        headers.insert("etag", "\"abc\"".parse().unwrap());
        headers.insert("x-amz-meta-owner", "infra".parse().unwrap());

        let meta = ObjectMetadata::from_headers(&HeaderReader::new(&headers)).unwrap();
        assert_eq!(meta.content_type.as_deref(), Some("text/plain"));
        assert_eq!(meta.content_length, Some(11));
        assert_eq!(meta.metadata["owner"], "infra");
        assert!(meta.last_modified.is_none());
    }
}
