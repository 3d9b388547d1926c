//! SigV4 request signing.
//!
//! Signing is deterministic over the finalized request, the signing time,
//! the service descriptor, and the credential:
//!
//! ```text
//! CanonicalRequest = Method \n CanonicalPath \n CanonicalQuery \n
//!                    CanonicalHeaders \n \n SignedHeaders \n HexSha256(Body)
//! StringToSign     = AWS4-HMAC-SHA256 \n Timestamp \n Scope \n
//!                    HexSha256(CanonicalRequest)
//! Signature        = HexHmacSha256(kSigning, StringToSign)
//! ```
//!
//! The canonical header set is fixed: `content-length`, `content-md5`,
//! `content-type`, `host`, plus every header starting with `x-amz-` that is
//! present when the signature is computed. The canonical query is sorted for
//! canonicalization only; the wire path keeps insertion order.

use std::fmt::Write;
use std::sync::Arc;

use http::header::{CONTENT_TYPE, DATE, HOST};
use http::{HeaderValue, Method};
use log::debug;
use percent_encoding::{percent_decode_str, utf8_percent_encode};

use crate::constants::{
    CONTENT_MD5, QUERY_ENCODE_SET, SIGNED_HEADER_PREFIX, URI_ENCODE_SET, X_AMZ_CONTENT_SHA_256,
    X_AMZ_DATE,
};
use crate::hash::{base64_md5, hex_hmac_sha256, hex_sha256, hmac_sha256};
use crate::request::FinalizedRequest;
use crate::time::{format_date, format_http_date, format_iso8601, now, DateTime};
use crate::{Credential, Error, Result, Service};

/// The algorithm identifier carried in the string-to-sign and the
/// authorization header.
pub const ALGORITHM: &str = "AWS4-HMAC-SHA256";

/// Methods that carry a body and therefore a numeric content length in the
/// canonical header block. Everything else canonicalizes `content-length`
/// with an empty value, which the remote side reproduces exactly.
const BODY_METHODS: [Method; 2] = [Method::POST, Method::PUT];

type Clock = Arc<dyn Fn() -> DateTime + Send + Sync>;

/// Signer that computes and attaches the v4 authorization header.
#[derive(Clone)]
pub struct Signer {
    service: Service,
    credential: Credential,
    clock: Clock,
}

impl std::fmt::Debug for Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signer")
            .field("service", &self.service)
            .field("credential", &self.credential)
            .finish()
    }
}

impl Signer {
    /// Create a signer for the given service and credential.
    pub fn new(service: Service, credential: Credential) -> Self {
        Self {
            service,
            credential,
            clock: Arc::new(now),
        }
    }

    /// Replace the signing clock.
    ///
    /// # Note
    ///
    /// We should always take current time to sign requests.
    /// Only use this function for testing.
    pub fn with_clock(mut self, clock: impl Fn() -> DateTime + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// The service this signer computes scope for.
    pub fn service(&self) -> &Service {
        &self.service
    }

    /// Sign the request: stamp the date headers, compute the signature over
    /// the canonical form, and attach the authorization header.
    ///
    /// Headers stamped before canonicalization join the signature
    /// (`host`, `x-amz-date`, `content-md5`, plus anything already present);
    /// `Date` and `X-Amz-Content-Sha256` are attached afterwards.
    pub fn sign(&self, req: &mut FinalizedRequest) -> Result<()> {
        let t = (self.clock)();
        self.sign_at(req, t)
    }

    fn sign_at(&self, req: &mut FinalizedRequest, t: DateTime) -> Result<()> {
        if req.is_sealed() {
            return Err(Error::request_sealed("cannot sign a sealed request"));
        }

        // Headers covered by the signature.
        req.insert_header(HOST, HeaderValue::from_str(self.service.host())?)?;
        req.insert_header(
            X_AMZ_DATE.parse().expect("static header name"),
            HeaderValue::from_str(&format_iso8601(t))?,
        )?;
        req.insert_header(
            CONTENT_MD5.parse().expect("static header name"),
            HeaderValue::from_str(&base64_md5(req.body()))?,
        )?;

        let creq = canonical_request_string(req)?;
        debug!("calculated canonical request:\n{creq}");

        let scope = format!(
            "{}/{}/{}/aws4_request",
            format_date(t),
            self.service.region(),
            self.service.name()
        );
        debug!("calculated scope: {scope}");

        let string_to_sign = {
            let mut f = String::new();
            writeln!(f, "{ALGORITHM}")?;
            writeln!(f, "{}", format_iso8601(t))?;
            writeln!(f, "{scope}")?;
            write!(f, "{}", hex_sha256(creq.as_bytes()))?;
            f
        };
        debug!("calculated string to sign:\n{string_to_sign}");

        let signing_key = derive_signing_key(
            self.credential.secret_access_key(),
            t,
            self.service.region(),
            self.service.name(),
        );
        let signature = hex_hmac_sha256(&signing_key, string_to_sign.as_bytes());

        let mut authorization = HeaderValue::from_str(&format!(
            "{ALGORITHM} Credential={}/{}, SignedHeaders={}, Signature={}",
            self.credential.access_key_id(),
            scope,
            signed_header_names(req).join(";"),
            signature
        ))?;
        authorization.set_sensitive(true);

        // Attached after signing; not part of the signed header set.
        req.insert_header(DATE, HeaderValue::from_str(&format_http_date(t))?)?;
        req.insert_header(
            X_AMZ_CONTENT_SHA_256.parse().expect("static header name"),
            HeaderValue::from_str(&hex_sha256(req.body()))?,
        )?;
        req.insert_header(http::header::AUTHORIZATION, authorization)?;

        Ok(())
    }
}

/// The sorted lowercase names of the headers covered by the signature:
/// the fixed four plus every `x-amz-` header present on the request.
fn signed_header_names(req: &FinalizedRequest) -> Vec<String> {
    let mut names = vec![
        "content-length".to_string(),
        "content-md5".to_string(),
        "content-type".to_string(),
        "host".to_string(),
    ];
    for name in req.headers().keys() {
        let name = name.as_str();
        if name.starts_with(SIGNED_HEADER_PREFIX) {
            names.push(name.to_string());
        }
    }
    names.sort_unstable();
    names.dedup();
    names
}

/// Build the canonical request text block.
pub fn canonical_request_string(req: &FinalizedRequest) -> Result<String> {
    // 256 is specially chosen to avoid reallocation for most requests.
    let mut f = String::with_capacity(256);

    writeln!(f, "{}", req.method())?;

    // Canonical path: empty becomes `/`, bytes normalized by a
    // decode-then-encode pass.
    let path = if req.path().is_empty() { "/" } else { req.path() };
    let path = percent_decode_str(path)
        .decode_utf8()
        .map_err(|e| Error::marshal_failed(format!("path is not valid utf-8: {e}")))?;
    writeln!(f, "{}", utf8_percent_encode(&path, &URI_ENCODE_SET))?;

    // Canonical query: encoded, then sorted. The request's own query order
    // is left alone; only the canonical form sorts.
    let mut query = req
        .query()
        .iter()
        .map(|(k, v)| {
            (
                utf8_percent_encode(k, &QUERY_ENCODE_SET).to_string(),
                utf8_percent_encode(v, &QUERY_ENCODE_SET).to_string(),
            )
        })
        .collect::<Vec<_>>();
    query.sort();
    writeln!(
        f,
        "{}",
        query
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&")
    )?;

    // Canonical headers, one per line.
    let names = signed_header_names(req);
    for name in &names {
        writeln!(f, "{}:{}", name, canonical_header_value(req, name)?)?;
    }
    writeln!(f)?;

    writeln!(f, "{}", names.join(";"))?;
    write!(f, "{}", hex_sha256(req.body()))?;

    Ok(f)
}

fn canonical_header_value(req: &FinalizedRequest, name: &str) -> Result<String> {
    // `content-length` is present with an empty value for bodiless methods;
    // body-carrying methods emit the numeric length. The asymmetry is a
    // protocol requirement.
    if name == "content-length" {
        if BODY_METHODS.contains(req.method()) {
            return Ok(req.body().len().to_string());
        }
        return Ok(String::new());
    }
    if name == "host" {
        return Ok(req.authority().as_str().to_string());
    }
    if name == CONTENT_MD5 {
        return Ok(base64_md5(req.body()));
    }
    if name == CONTENT_TYPE {
        return match req.headers().get(CONTENT_TYPE) {
            None => Ok(String::new()),
            Some(v) => Ok(v.to_str()?.trim().to_string()),
        };
    }

    match req.headers().get(name) {
        None => Ok(String::new()),
        Some(v) => Ok(v.to_str()?.trim().to_string()),
    }
}

/// Derive the per-day/per-region/per-service signing key.
///
/// `kSecret = "AWS4" + secret`, then an HMAC-SHA256 chain over the date
/// stamp, region, service name, and the literal `aws4_request`.
pub fn derive_signing_key(secret: &str, t: DateTime, region: &str, service: &str) -> Vec<u8> {
    let secret = format!("AWS4{secret}");
    let k_date = hmac_sha256(secret.as_bytes(), format_date(t).as_bytes());
    let k_region = hmac_sha256(k_date.as_slice(), region.as_bytes());
    let k_service = hmac_sha256(k_region.as_slice(), service.as_bytes());

    hmac_sha256(k_service.as_slice(), "aws4_request".as_bytes())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use chrono::Utc;
    use http::Uri;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::request::{Body, Request};

    fn test_signer() -> Signer {
        let service = Service::new("logs", "us-east-1", "https://logs.us-east-1.amazonaws.com")
            .expect("descriptor must be valid");
        let cred = Credential::new("AKIDEXAMPLE", "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY");
        Signer::new(service, cred)
            .with_clock(|| Utc.with_ymd_and_hms(2014, 6, 11, 0, 0, 0).unwrap())
    }

    fn trivial_get() -> FinalizedRequest {
        let uri: Uri =
            "https://logs.us-east-1.amazonaws.com/?Action=DescribeLogGroups&Version=2014-03-28"
                .parse()
                .unwrap();
        Request::client(Method::GET, &uri).unwrap().finalize().unwrap()
    }

    #[test]
    fn test_signing_key_derivation_vector() {
        // Published v4 test vector.
        let t = Utc.with_ymd_and_hms(2015, 8, 30, 12, 36, 0).unwrap();
        let key = derive_signing_key(
            "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY",
            t,
            "us-east-1",
            "iam",
        );
        assert_eq!(
            hex::encode(key),
            "c4afb1cc5771d871763a393e44b703571b55cc28424d1a5e86da6ed3c154a4b9"
        );
    }

    #[test]
    fn test_sign_trivial_get() {
        let mut req = trivial_get();
        test_signer().sign(&mut req).expect("signing must succeed");

        let auth = req
            .headers()
            .get(http::header::AUTHORIZATION)
            .unwrap()
            .to_str()
            .unwrap();
        let expected_prefix = "AWS4-HMAC-SHA256 \
             Credential=AKIDEXAMPLE/20140611/us-east-1/logs/aws4_request, \
             SignedHeaders=content-length;content-md5;content-type;host;x-amz-date, \
             Signature=";
        assert!(
            auth.starts_with(expected_prefix),
            "authorization header mismatch: {auth}"
        );
        let signature = auth.rsplit('=').next().unwrap();
        assert_eq!(signature.len(), 64);
        assert!(signature.chars().all(|c| c.is_ascii_hexdigit()));

        // Headers attached after signing.
        assert_eq!(
            req.headers().get(X_AMZ_DATE).unwrap(),
            "20140611T000000Z"
        );
        assert_eq!(
            req.headers().get(DATE).unwrap(),
            "Wed, 11 Jun 2014 00:00:00 GMT"
        );
        assert_eq!(
            req.headers().get(CONTENT_MD5).unwrap(),
            "1B2M2Y8AsgTpgAmY7PhCfg=="
        );
        assert_eq!(
            req.headers().get(X_AMZ_CONTENT_SHA_256).unwrap(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_canonical_request_stability() {
        let signer = test_signer();

        let build = || {
            let mut req = trivial_get();
            signer.sign(&mut req).unwrap();
            canonical_request_string(&req).unwrap()
        };

        assert_eq!(build(), build(), "canonical request must be byte-identical");
    }

    #[test]
    fn test_signature_determinism() {
        let signer = test_signer();
        let auth = |req: &mut FinalizedRequest| {
            signer.sign(req).unwrap();
            req.headers()
                .get(http::header::AUTHORIZATION)
                .unwrap()
                .to_str()
                .unwrap()
                .to_string()
        };

        assert_eq!(auth(&mut trivial_get()), auth(&mut trivial_get()));
    }

    #[test]
    fn test_canonical_content_length_asymmetry() {
        // GET: the key is present, the value empty.
        let mut get = trivial_get();
        test_signer().sign(&mut get).unwrap();
        let creq = canonical_request_string(&get).unwrap();
        assert!(creq.contains("\ncontent-length:\n"), "{creq}");

        // PUT: numeric value.
        let uri: Uri = "https://logs.us-east-1.amazonaws.com/".parse().unwrap();
        let mut req = Request::server(Method::PUT, &uri).unwrap();
        req.body(Body::Bytes(bytes::Bytes::from_static(b"Hello,World!")));
        let mut put = req.finalize().unwrap();
        test_signer().sign(&mut put).unwrap();
        let creq = canonical_request_string(&put).unwrap();
        assert!(creq.contains("\ncontent-length:12\n"), "{creq}");
    }

    #[test]
    fn test_canonical_query_sorted_wire_order_kept() {
        let uri: Uri = "https://logs.us-east-1.amazonaws.com/".parse().unwrap();
        let mut req = Request::client(Method::GET, &uri).unwrap();
        req.query_pair("Zebra", "1");
        req.query_pair("Alpha", "2");
        let mut fin = req.finalize().unwrap();
        test_signer().sign(&mut fin).unwrap();

        let creq = canonical_request_string(&fin).unwrap();
        assert!(creq.contains("\nAlpha=2&Zebra=1\n"), "{creq}");
        // Wire path keeps the caller's order.
        assert_eq!(fin.wire_query(), "Zebra=1&Alpha=2");
    }

    #[test]
    fn test_x_amz_headers_join_signature() {
        let uri: Uri = "https://bucket.s3.amazonaws.com/key".parse().unwrap();
        let mut req = Request::server(Method::PUT, &uri).unwrap();
        req.header(
            "x-amz-acl".parse().unwrap(),
            HeaderValue::from_static("public-read"),
        );
        req.header(
            "x-amz-meta-owner".parse().unwrap(),
            HeaderValue::from_static("infra"),
        );
        req.body(Body::Bytes(bytes::Bytes::from_static(b"data")));
        let mut fin = req.finalize().unwrap();

        let service = Service::new("s3", "us-east-1", "https://bucket.s3.amazonaws.com").unwrap();
        let signer = Signer::new(service, Credential::new("ak", "sk"))
            .with_clock(|| Utc.with_ymd_and_hms(2014, 6, 11, 0, 0, 0).unwrap());
        signer.sign(&mut fin).unwrap();

        let auth = fin
            .headers()
            .get(http::header::AUTHORIZATION)
            .unwrap()
            .to_str()
            .unwrap();
        assert!(
            auth.contains(
                "SignedHeaders=content-length;content-md5;content-type;host;\
                 x-amz-acl;x-amz-date;x-amz-meta-owner,"
            ),
            "{auth}"
        );
    }

    #[test]
    fn test_sign_rejects_sealed_request() {
        let mut req = trivial_get();
        req.seal();
        let err = test_signer().sign(&mut req).expect_err("sealed");
        assert_eq!(err.kind(), crate::ErrorKind::RequestSealed);
    }
}
