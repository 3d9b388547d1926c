//! Body codec: content-type-driven selection of the request body encoding
//! and the matching response decoders.

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::{Error, Result};

/// Media types understood by the body codec.
pub mod content_type {
    /// Plain text bodies.
    pub const TEXT_PLAIN: &str = "text/plain";
    /// Form-encoded bodies, rendered like a query string.
    pub const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";
    /// XML bodies.
    pub const XML: &str = "application/xml";
    /// JSON bodies.
    pub const JSON: &str = "application/json";
    /// Vendor JSON media type, protocol revision 1.0.
    pub const AMZ_JSON_1_0: &str = "application/x-amz-json-1.0";
    /// Vendor JSON media type, protocol revision 1.1.
    pub const AMZ_JSON_1_1: &str = "application/x-amz-json-1.1";
    /// Raw byte bodies.
    pub const OCTET_STREAM: &str = "binary/octet-stream";
}

/// Whether the given media type selects the JSON encoder.
///
/// Vendor JSON types such as `application/x-amz-json-1.0` count as JSON.
pub fn is_json(content_type: &str) -> bool {
    content_type == content_type::JSON
        || content_type.starts_with("application/x-amz-json")
        || content_type.ends_with("+json")
}

/// A value that can render itself as a request body once the content type
/// is known.
///
/// Blanket-implemented for every `serde::Serialize` type; the facade picks
/// the wire form by setting `Content-Type` before finalization.
pub trait EncodeBody: Send + Sync {
    /// Encode the value for the given content type.
    fn encode(&self, content_type: &str) -> Result<Bytes>;
}

impl<T: Serialize + Send + Sync> EncodeBody for T {
    fn encode(&self, content_type: &str) -> Result<Bytes> {
        if is_json(content_type) {
            let buf = serde_json::to_vec(self)
                .map_err(|e| Error::marshal_failed(format!("json body: {e}")))?;
            return Ok(Bytes::from(buf));
        }

        match content_type {
            content_type::XML => {
                let s = quick_xml::se::to_string(self)
                    .map_err(|e| Error::marshal_failed(format!("xml body: {e}")))?;
                Ok(Bytes::from(s))
            }
            content_type::FORM_URLENCODED => {
                let s = serde_urlencoded::to_string(self)
                    .map_err(|e| Error::marshal_failed(format!("form body: {e}")))?;
                Ok(Bytes::from(s))
            }
            other => Err(Error::marshal_failed(format!(
                "no encoder for content type {other}"
            ))),
        }
    }
}

/// Decode an XML response body.
pub fn decode_xml<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    let text = std::str::from_utf8(body)
        .map_err(|e| Error::decode_failed(format!("xml body is not utf-8: {e}")))?;
    quick_xml::de::from_str(text).map_err(|e| Error::decode_failed(format!("xml body: {e}")))
}

/// Decode a JSON response body.
///
/// An empty body decodes like `{}` since JSON services answer some
/// operations with nothing at all.
pub fn decode_json<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    let body = if body.is_empty() { b"{}" } else { body };
    serde_json::from_slice(body).map_err(|e| Error::decode_failed(format!("json body: {e}")))
}
