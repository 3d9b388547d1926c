//! Response evaluation: retry classification and typed decoding.

use bytes::Bytes;
use http::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::body::{decode_json, decode_xml};
use crate::param::{FromHeaders, HeaderReader};
use crate::{Error, Result, ServiceError, ServiceErrorKind};

/// The wire form a service family answers with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    /// XML documents.
    Xml,
    /// JSON documents.
    Json,
    /// No body worth decoding.
    Empty,
}

/// Per-service-family response evaluator.
///
/// Holds the decoder choice, the statuses that mean "transient, retry",
/// and optionally the statuses that are definitely fatal. Everything else
/// at or above 400 decodes into a typed [`ServiceError`].
#[derive(Debug, Clone)]
pub struct Evaluator {
    format: ResponseFormat,
    transient: Vec<u16>,
    fatal: Option<Vec<u16>>,
}

impl Evaluator {
    /// Create an evaluator with the default transient set {500, 503}.
    pub fn new(format: ResponseFormat) -> Self {
        Self {
            format,
            transient: vec![500, 503],
            fatal: None,
        }
    }

    /// Replace the transient status set.
    pub fn with_transient(mut self, statuses: &[u16]) -> Self {
        self.transient = statuses.to_vec();
        self
    }

    /// Declare statuses that must never be retried even if a later rule
    /// would classify them otherwise.
    pub fn with_fatal(mut self, statuses: &[u16]) -> Self {
        self.fatal = Some(statuses.to_vec());
        self
    }

    /// The decoder this evaluator applies.
    pub fn format(&self) -> ResponseFormat {
        self.format
    }

    /// Whether the status belongs to the transient set.
    pub fn is_transient(&self, status: StatusCode) -> bool {
        if let Some(fatal) = &self.fatal {
            if fatal.contains(&status.as_u16()) {
                return false;
            }
        }
        self.transient.contains(&status.as_u16())
    }

    /// Evaluate a response into the caller's typed result.
    pub fn evaluate<T: DeserializeOwned>(&self, resp: http::Response<Bytes>) -> Result<T> {
        let (parts, body) = resp.into_parts();
        self.check_status(parts.status, &body)?;
        self.decode(&body)
    }

    /// Evaluate a response, additionally unmarshalling header-carried
    /// metadata.
    pub fn evaluate_with_headers<T, H>(&self, resp: http::Response<Bytes>) -> Result<(T, H)>
    where
        T: DeserializeOwned,
        H: FromHeaders,
    {
        let (parts, body) = resp.into_parts();
        self.check_status(parts.status, &body)?;
        let headers = H::from_headers(&HeaderReader::new(&parts.headers))?;
        Ok((self.decode(&body)?, headers))
    }

    /// Evaluate a response whose body is opaque bytes (object downloads),
    /// unmarshalling header-carried metadata alongside.
    pub fn evaluate_raw<H: FromHeaders>(&self, resp: http::Response<Bytes>) -> Result<(Bytes, H)> {
        let (parts, body) = resp.into_parts();
        self.check_status(parts.status, &body)?;
        let headers = H::from_headers(&HeaderReader::new(&parts.headers))?;
        Ok((body, headers))
    }

    fn check_status(&self, status: StatusCode, body: &[u8]) -> Result<()> {
        if status.is_success() {
            return Ok(());
        }
        if self.is_transient(status) {
            return Err(Error::service_transient(status));
        }

        Err(Error::service(self.decode_service_error(status, body)))
    }

    fn decode<T: DeserializeOwned>(&self, body: &[u8]) -> Result<T> {
        match self.format {
            ResponseFormat::Xml => decode_xml(body),
            ResponseFormat::Json => decode_json(body),
            // Services answering nothing decode like a JSON null.
            ResponseFormat::Empty => serde_json::from_str("null")
                .map_err(|e| Error::decode_failed(format!("empty response: {e}"))),
        }
    }

    fn decode_service_error(&self, status: StatusCode, body: &[u8]) -> ServiceError {
        let kind = if status.is_client_error() {
            ServiceErrorKind::Client
        } else {
            ServiceErrorKind::Server
        };

        let decoded = match self.format {
            ResponseFormat::Json => decode_json_error(body),
            _ => decode_xml_error(body),
        };
        let (code, message) = decoded.unwrap_or_else(|| {
            (
                status
                    .canonical_reason()
                    .unwrap_or("UnknownError")
                    .to_string(),
                String::from_utf8_lossy(body).into_owned(),
            )
        });

        ServiceError {
            status,
            code,
            message,
            kind,
            retryable: false,
        }
    }
}

#[derive(Debug, Deserialize)]
struct XmlErrorBody {
    #[serde(rename = "Code", default)]
    code: String,
    #[serde(rename = "Message", default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct XmlErrorResponseBody {
    #[serde(rename = "Error")]
    error: XmlErrorBody,
}

/// Decode `<Error>` or `<ErrorResponse><Error>` bodies.
fn decode_xml_error(body: &[u8]) -> Option<(String, String)> {
    let text = std::str::from_utf8(body).ok()?;
    if let Ok(wrapped) = quick_xml::de::from_str::<XmlErrorResponseBody>(text) {
        return Some((wrapped.error.code, wrapped.error.message));
    }
    let plain = quick_xml::de::from_str::<XmlErrorBody>(text).ok()?;
    if plain.code.is_empty() {
        return None;
    }
    Some((plain.code, plain.message))
}

#[derive(Debug, Deserialize)]
struct JsonErrorBody {
    #[serde(rename = "__type", default)]
    typ: String,
    #[serde(rename = "message", alias = "Message", default)]
    message: String,
}

/// Decode `{"__type": "prefix#Code", "message": …}` bodies.
fn decode_json_error(body: &[u8]) -> Option<(String, String)> {
    let err: JsonErrorBody = serde_json::from_slice(body).ok()?;
    if err.typ.is_empty() {
        return None;
    }
    let code = err.typ.rsplit('#').next().unwrap_or(&err.typ).to_string();
    Some((code, err.message))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::ErrorKind;

    fn response(status: u16, body: &'static [u8]) -> http::Response<Bytes> {
        http::Response::builder()
            .status(status)
            .body(Bytes::from_static(body))
            .unwrap()
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct ListTablesOutput {
        #[serde(rename = "TableNames", default)]
        table_names: Vec<String>,
    }

    #[test]
    fn test_success_decodes_json() {
        let out: ListTablesOutput = Evaluator::new(ResponseFormat::Json)
            .evaluate(response(200, br#"{"TableNames":["users","orders"]}"#))
            .unwrap();
        assert_eq!(out.table_names, vec!["users", "orders"]);
    }

    #[test]
    fn test_transient_status_is_retryable() {
        let err = Evaluator::new(ResponseFormat::Xml)
            .evaluate::<()>(response(503, b""))
            .expect_err("503 is transient");
        assert_eq!(err.kind(), ErrorKind::ServiceTransient);
        assert!(err.is_retryable());
    }

    #[test]
    fn test_custom_transient_set() {
        let evaluator = Evaluator::new(ResponseFormat::Json).with_transient(&[408, 500, 503]);
        let err = evaluator
            .evaluate::<()>(response(408, b""))
            .expect_err("stall-prone family retries 408");
        assert_eq!(err.kind(), ErrorKind::ServiceTransient);
    }

    #[test]
    fn test_fatal_overrides_transient() {
        let evaluator = Evaluator::new(ResponseFormat::Json).with_fatal(&[503]);
        let err = evaluator
            .evaluate::<()>(response(503, b""))
            .expect_err("503 declared fatal");
        assert_eq!(err.kind(), ErrorKind::Service);
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_xml_service_error() {
        // Spec scenario: HTTP 400 with a NoSuchBucket XML error body.
        let body =
            b"<Error><Code>NoSuchBucket</Code><Message>The specified bucket does not exist</Message></Error>";
        let err = Evaluator::new(ResponseFormat::Xml)
            .evaluate::<()>(response(400, body))
            .expect_err("400 is surfaced");

        assert_eq!(err.kind(), ErrorKind::Service);
        let detail = err.service_error().unwrap();
        assert_eq!(detail.status.as_u16(), 400);
        assert_eq!(detail.code, "NoSuchBucket");
        assert_eq!(detail.kind, crate::ServiceErrorKind::Client);
        assert!(!detail.retryable);
    }

    #[test]
    fn test_xml_error_response_wrapper() {
        let body = b"<ErrorResponse><Error><Code>Throttling</Code><Message>Rate exceeded</Message></Error></ErrorResponse>";
        let err = Evaluator::new(ResponseFormat::Xml)
            .evaluate::<()>(response(400, body))
            .expect_err("must surface");
        assert_eq!(err.service_error().unwrap().code, "Throttling");
    }

    #[test]
    fn test_json_service_error() {
        let body = br#"{"__type":"com.amazonaws.dynamodb.v20120810#ResourceNotFoundException","message":"Requested resource not found"}"#;
        let err = Evaluator::new(ResponseFormat::Json)
            .evaluate::<()>(response(400, body))
            .expect_err("must surface");
        assert_eq!(
            err.service_error().unwrap().code,
            "ResourceNotFoundException"
        );
    }

    #[test]
    fn test_undecodable_error_body_falls_back() {
        let err = Evaluator::new(ResponseFormat::Xml)
            .evaluate::<()>(response(403, b"not xml at all"))
            .expect_err("must surface");
        assert_eq!(err.service_error().unwrap().code, "Forbidden");
    }

    #[test]
    fn test_decode_failure_on_success_is_fatal() {
        let err = Evaluator::new(ResponseFormat::Json)
            .evaluate::<ListTablesOutput>(response(200, b"<xml/>"))
            .expect_err("2xx body must parse");
        assert_eq!(err.kind(), ErrorKind::DecodeFailed);
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_empty_format_unit_result() {
        Evaluator::new(ResponseFormat::Empty)
            .evaluate::<()>(response(204, b""))
            .expect("unit result decodes from nothing");
    }

    #[test]
    fn test_raw_bytes_pass_through() {
        #[derive(Debug)]
        struct NoMeta;
        impl FromHeaders for NoMeta {
            fn from_headers(_: &HeaderReader<'_>) -> crate::Result<Self> {
                Ok(Self)
            }
        }

        let (body, _meta): (Bytes, NoMeta) = Evaluator::new(ResponseFormat::Empty)
            .evaluate_raw(response(200, b"\x00\x01binary"))
            .unwrap();
        assert_eq!(&body[..], b"\x00\x01binary");
    }

    #[test]
    fn test_header_extraction() {
        use crate::param::Tag;

        #[derive(Debug, PartialEq)]
        struct Meta {
            etag: Option<String>,
        }

        impl FromHeaders for Meta {
            fn from_headers(r: &HeaderReader<'_>) -> crate::Result<Self> {
                Ok(Self {
                    etag: r.read_opt_str(&Tag::named("ETag"))?,
                })
            }
        }

        let resp = http::Response::builder()
            .status(200)
            .header("etag", "\"abc123\"")
            .body(Bytes::from_static(b"{}"))
            .unwrap();

        // The unit result comes from the Empty decoder; a Json evaluator
        // would insist on deserializing the `{}` document.
        let (_, meta): ((), Meta) = Evaluator::new(ResponseFormat::Empty)
            .evaluate_with_headers(resp)
            .unwrap();
        assert_eq!(meta.etag.as_deref(), Some("\"abc123\""));
    }
}
