use std::fmt;

use http::StatusCode;
use thiserror::Error;

/// The error type for cloudcall operations.
#[derive(Error, Debug)]
#[error("{kind}: {message}")]
pub struct Error {
    kind: ErrorKind,
    message: String,
    #[source]
    source: Option<anyhow::Error>,
    service: Option<ServiceError>,
}

/// The kind of error that occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Construction-time problems: missing credentials, malformed endpoint,
    /// unsupported content type. Never retried.
    ConfigInvalid,

    /// Request parameters or body cannot be rendered. Caller bug, fatal.
    MarshalFailed,

    /// Header mutation was attempted on a request that is already signed.
    RequestSealed,

    /// Network-layer failure (DNS, TLS, connection reset). Retryable.
    TransportFailed,

    /// The service answered with a status from its transient set. Retryable.
    ServiceTransient,

    /// The service rejected the call with a non-transient 4xx/5xx.
    Service,

    /// A 2xx body failed to parse into the caller's typed result. Fatal.
    DecodeFailed,
}

/// Classification a service error carries on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceErrorKind {
    /// The caller's fault: the request will not succeed if replayed.
    Client,
    /// The service's fault, but not flagged for retry.
    Server,
    /// The service's fault and safe to replay.
    Transient,
}

/// Typed error decoded from a service's error response body.
#[derive(Debug, Clone)]
pub struct ServiceError {
    /// HTTP status of the response.
    pub status: StatusCode,
    /// Short machine-readable code, e.g. `NoSuchBucket`.
    pub code: String,
    /// Human-readable message from the service.
    pub message: String,
    /// Client / server / transient classification.
    pub kind: ServiceErrorKind,
    /// Whether the call may be replayed. Always `false` once surfaced.
    pub retryable: bool,
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.code, self.status, self.message)
    }
}

impl Error {
    /// Create a new error with the given kind and message.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
            service: None,
        }
    }

    /// Add a source error.
    pub fn with_source(mut self, source: impl Into<anyhow::Error>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Get the error kind.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The decoded service error, if the service produced one.
    pub fn service_error(&self) -> Option<&ServiceError> {
        self.service.as_ref()
    }

    /// Whether the transport may replay the request that produced this error.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::TransportFailed | ErrorKind::ServiceTransient
        )
    }
}

// Convenience constructors
impl Error {
    /// Create a config invalid error.
    pub fn config_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConfigInvalid, message)
    }

    /// Create a marshal failed error.
    pub fn marshal_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::MarshalFailed, message)
    }

    /// Create a request sealed error.
    pub fn request_sealed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RequestSealed, message)
    }

    /// Create a transport failed error.
    pub fn transport_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TransportFailed, message)
    }

    /// Create a transient service error for the given status.
    pub fn service_transient(status: StatusCode) -> Self {
        Self::new(
            ErrorKind::ServiceTransient,
            format!("service answered transient status {status}"),
        )
    }

    /// Create a typed service error.
    pub fn service(err: ServiceError) -> Self {
        let mut e = Self::new(ErrorKind::Service, err.to_string());
        e.service = Some(err);
        e
    }

    /// Create a decode failed error.
    pub fn decode_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::DecodeFailed, message)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::ConfigInvalid => write!(f, "invalid configuration"),
            ErrorKind::MarshalFailed => write!(f, "marshalling failed"),
            ErrorKind::RequestSealed => write!(f, "request already sealed"),
            ErrorKind::TransportFailed => write!(f, "transport failed"),
            ErrorKind::ServiceTransient => write!(f, "transient service error"),
            ErrorKind::Service => write!(f, "service error"),
            ErrorKind::DecodeFailed => write!(f, "decoding failed"),
        }
    }
}

/// Convenience type alias for Results.
pub type Result<T> = std::result::Result<T, Error>;

// Common From implementations
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::transport_failed(err.to_string()).with_source(err)
    }
}

impl From<std::fmt::Error> for Error {
    fn from(err: std::fmt::Error) -> Self {
        Self::marshal_failed(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<http::Error> for Error {
    fn from(err: http::Error) -> Self {
        Self::marshal_failed(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<http::header::InvalidHeaderValue> for Error {
    fn from(err: http::header::InvalidHeaderValue) -> Self {
        Self::marshal_failed(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<http::header::InvalidHeaderName> for Error {
    fn from(err: http::header::InvalidHeaderName) -> Self {
        Self::marshal_failed(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<http::uri::InvalidUri> for Error {
    fn from(err: http::uri::InvalidUri) -> Self {
        Self::marshal_failed(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<http::uri::InvalidUriParts> for Error {
    fn from(err: http::uri::InvalidUriParts) -> Self {
        Self::marshal_failed(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<http::header::ToStrError> for Error {
    fn from(err: http::header::ToStrError) -> Self {
        Self::marshal_failed(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::transport_failed(err.to_string()).with_source(anyhow::Error::from(err))
    }
}
