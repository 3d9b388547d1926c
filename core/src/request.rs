//! Request construction and finalization.
//!
//! A [`Request`] stays mutable while the caller fills in parameters and a
//! body source; [`Request::finalize`] renders it into a
//! [`FinalizedRequest`] whose body bytes are fixed, so signing and retry
//! replay work over the exact same payload.

use std::fmt::Debug;
use std::io::Read;
use std::mem;

use bytes::Bytes;
use http::header::{HeaderName, CONTENT_LENGTH, CONTENT_TYPE};
use http::uri::{Authority, PathAndQuery, Scheme};
use http::{HeaderMap, HeaderValue, Method, Uri};
use percent_encoding::utf8_percent_encode;

use crate::body::{content_type, EncodeBody};
use crate::constants::QUERY_ENCODE_SET;
use crate::param::{ParamWriter, ToParams};
use crate::{Error, Result};

/// Reader bodies larger than this fail finalization instead of being
/// buffered; retry replay needs the whole body in memory.
pub const MAX_REPLAY_BODY: usize = 64 * 1024 * 1024;

/// The body source of a request. Exactly one kind at a time.
pub enum Body {
    /// No body at all.
    Empty,
    /// An opaque byte sequence.
    Bytes(Bytes),
    /// Text, sent as `text/plain` unless a content type is set.
    Text(String),
    /// A streaming reader, drained and buffered once at finalization.
    Reader(Box<dyn Read + Send>),
    /// A value encoded by the body codec; `Content-Type` selects the
    /// encoder and must be set before finalization.
    Value(Box<dyn EncodeBody>),
}

impl Debug for Body {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Body::Empty => f.write_str("Body::Empty"),
            Body::Bytes(b) => write!(f, "Body::Bytes({} bytes)", b.len()),
            Body::Text(s) => write!(f, "Body::Text({} chars)", s.len()),
            Body::Reader(_) => f.write_str("Body::Reader"),
            Body::Value(_) => f.write_str("Body::Value"),
        }
    }
}

/// A mutable request under construction.
#[derive(Debug)]
pub struct Request {
    method: Method,
    scheme: Scheme,
    authority: Authority,
    path: String,
    query: Vec<(String, String)>,
    form: Vec<(String, String)>,
    headers: HeaderMap,
    body: Body,
}

fn split_endpoint(endpoint: &Uri) -> Result<(Scheme, Authority, String, Vec<(String, String)>)> {
    let parts = endpoint.clone().into_parts();
    let scheme = parts.scheme.unwrap_or(Scheme::HTTPS);
    let authority = parts
        .authority
        .ok_or_else(|| Error::marshal_failed("endpoint without authority"))?;
    let (path, query) = match parts.path_and_query {
        None => ("/".to_string(), Vec::new()),
        Some(paq) => {
            let query = paq
                .query()
                .map(|q| {
                    form_urlencoded::parse(q.as_bytes())
                        .map(|(k, v)| (k.into_owned(), v.into_owned()))
                        .collect()
                })
                .unwrap_or_default();
            (paq.path().to_string(), query)
        }
    };
    Ok((scheme, authority, path, query))
}

impl Request {
    /// Build a client request: GET, DELETE, or HEAD, parameters carried by
    /// the query string.
    pub fn client(method: Method, endpoint: &Uri) -> Result<Self> {
        if !matches!(method, Method::GET | Method::DELETE | Method::HEAD) {
            return Err(Error::marshal_failed(format!(
                "{method} is not a client request method"
            )));
        }
        Self::build(method, endpoint)
    }

    /// Build a server request: POST or PUT, parameters carried by the body.
    pub fn server(method: Method, endpoint: &Uri) -> Result<Self> {
        if !matches!(method, Method::POST | Method::PUT) {
            return Err(Error::marshal_failed(format!(
                "{method} is not a server request method"
            )));
        }
        Self::build(method, endpoint)
    }

    fn build(method: Method, endpoint: &Uri) -> Result<Self> {
        let (scheme, authority, path, query) = split_endpoint(endpoint)?;
        Ok(Self {
            method,
            scheme,
            authority,
            path,
            query,
            form: Vec::new(),
            headers: HeaderMap::new(),
            body: Body::Empty,
        })
    }

    /// Replace the request path.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Append one query parameter. Keys keep their insertion order.
    pub fn query_pair(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Render a structured value's fields as query parameters.
    ///
    /// Any query the endpoint URL carried is overwritten.
    pub fn query_value<T: ToParams>(&mut self, value: &T) -> &mut Self {
        let mut w = ParamWriter::new();
        value.to_params(&mut w);
        self.query = w.into_pairs();
        self
    }

    /// Append one form parameter.
    pub fn form_pair(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.form.push((key.into(), value.into()));
        self
    }

    /// Render a structured value's fields as form parameters.
    pub fn form_value<T: ToParams>(&mut self, value: &T) -> &mut Self {
        let mut w = ParamWriter::new();
        value.to_params(&mut w);
        self.form = w.into_pairs();
        self
    }

    /// Set a header.
    pub fn header(&mut self, name: HeaderName, value: HeaderValue) -> &mut Self {
        self.headers.insert(name, value);
        self
    }

    /// Merge a pre-built header map (header-carried request metadata).
    pub fn headers(&mut self, headers: HeaderMap) -> &mut Self {
        self.headers.extend(headers);
        self
    }

    /// Set the body source.
    pub fn body(&mut self, body: Body) -> &mut Self {
        self.body = body;
        self
    }

    /// Render the request into its finalized, byte-exact form.
    pub fn finalize(mut self) -> Result<FinalizedRequest> {
        // Form parameters become the body, encoded as the query string
        // would be.
        if !self.form.is_empty() {
            if !matches!(self.body, Body::Empty) {
                return Err(Error::marshal_failed(
                    "request carries both form parameters and a body",
                ));
            }
            let mut ser = form_urlencoded::Serializer::new(String::new());
            for (k, v) in &self.form {
                ser.append_pair(k, v);
            }
            self.body = Body::Bytes(Bytes::from(ser.finish()));
            if !self.headers.contains_key(CONTENT_TYPE) {
                self.headers.insert(
                    CONTENT_TYPE,
                    HeaderValue::from_static(content_type::FORM_URLENCODED),
                );
            }
        }

        let body = match mem::replace(&mut self.body, Body::Empty) {
            Body::Empty => Bytes::new(),
            Body::Bytes(b) => b,
            Body::Text(s) => {
                if !self.headers.contains_key(CONTENT_TYPE) {
                    self.headers
                        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type::TEXT_PLAIN));
                }
                Bytes::from(s)
            }
            Body::Reader(mut r) => {
                let mut buf = Vec::new();
                let n = r
                    .by_ref()
                    .take((MAX_REPLAY_BODY + 1) as u64)
                    .read_to_end(&mut buf)
                    .map_err(|e| {
                        Error::marshal_failed(format!("draining reader body: {e}"))
                    })?;
                if n > MAX_REPLAY_BODY {
                    return Err(Error::marshal_failed(format!(
                        "reader body exceeds the {MAX_REPLAY_BODY} byte replay cap"
                    )));
                }
                Bytes::from(buf)
            }
            Body::Value(v) => {
                let ct = self
                    .headers
                    .get(CONTENT_TYPE)
                    .ok_or_else(|| {
                        Error::marshal_failed("value body requires Content-Type to be set")
                    })?
                    .to_str()?
                    .to_string();
                v.encode(&ct)?
            }
        };

        self.headers.insert(
            CONTENT_LENGTH,
            HeaderValue::from_str(&body.len().to_string())?,
        );

        Ok(FinalizedRequest {
            method: self.method,
            scheme: self.scheme,
            authority: self.authority,
            path: self.path,
            query: self.query,
            headers: self.headers,
            body,
            sealed: false,
        })
    }
}

/// A finalized request: body bytes fixed, ready for signing and dispatch.
///
/// Headers remain mutable until [`FinalizedRequest::seal`]; the client
/// seals immediately after the signer returns so a mismatching signature
/// cannot be produced by later mutation.
#[derive(Debug, Clone)]
pub struct FinalizedRequest {
    method: Method,
    scheme: Scheme,
    authority: Authority,
    path: String,
    query: Vec<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
    sealed: bool,
}

impl FinalizedRequest {
    /// HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The authority the request targets, as carried by `Host`.
    pub fn authority(&self) -> &Authority {
        &self.authority
    }

    /// Request path. Empty paths canonicalize to `/` in the signer.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Query parameters in insertion order, decoded.
    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    /// Headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The exact body bytes that will be transmitted and signed.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Insert a header. Fails once the request is sealed.
    pub fn insert_header(&mut self, name: HeaderName, value: HeaderValue) -> Result<()> {
        if self.sealed {
            return Err(Error::request_sealed(format!(
                "cannot set {name} after the request is signed"
            )));
        }
        self.headers.insert(name, value);
        Ok(())
    }

    /// Forbid further header mutation.
    pub fn seal(&mut self) {
        self.sealed = true;
    }

    /// Whether the request is sealed.
    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// The wire query string: keys in insertion order, RFC 3986 encoded.
    pub fn wire_query(&self) -> String {
        let mut s = String::new();
        for (i, (k, v)) in self.query.iter().enumerate() {
            if i > 0 {
                s.push('&');
            }
            s.push_str(&utf8_percent_encode(k, &QUERY_ENCODE_SET).to_string());
            if !v.is_empty() {
                s.push('=');
                s.push_str(&utf8_percent_encode(v, &QUERY_ENCODE_SET).to_string());
            }
        }
        s
    }

    /// Produce the `http` request for dispatch.
    pub fn to_http(&self) -> Result<http::Request<Bytes>> {
        let paq = {
            let path = if self.path.is_empty() { "/" } else { &self.path };
            let query = self.wire_query();
            if query.is_empty() {
                path.to_string()
            } else {
                format!("{path}?{query}")
            }
        };

        let uri = Uri::builder()
            .scheme(self.scheme.clone())
            .authority(self.authority.clone())
            .path_and_query(PathAndQuery::try_from(paq.as_str())?)
            .build()?;

        let mut builder = http::Request::builder().method(self.method.clone()).uri(uri);
        for (k, v) in self.headers.iter() {
            builder = builder.header(k, v);
        }

        Ok(builder.body(self.body.clone())?)
    }
}
