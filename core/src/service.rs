use http::Uri;

use crate::{Error, Result};

/// The region assumed when none is configured.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Environment variable consulted by [`Service::from_env_region`].
pub const REGION_ENV_VAR: &str = "CLOUD_REGION";

/// Identifies a target service by (service name, region name, endpoint).
///
/// The descriptor is immutable and may be shared by any number of requests;
/// the region participates in the signer's scope string exactly as provided.
#[derive(Debug, Clone)]
pub struct Service {
    name: String,
    region: String,
    endpoint: Uri,
}

impl Service {
    /// Create a service descriptor.
    ///
    /// The endpoint must be an absolute HTTPS URL. An empty region selects
    /// [`DEFAULT_REGION`].
    pub fn new(name: impl Into<String>, region: impl Into<String>, endpoint: &str) -> Result<Self> {
        let endpoint: Uri = endpoint
            .parse()
            .map_err(|e| Error::config_invalid(format!("malformed endpoint: {e}")))?;

        if endpoint.scheme_str() != Some("https") {
            return Err(Error::config_invalid(format!(
                "endpoint {endpoint} must be an absolute https url"
            )));
        }
        if endpoint.authority().is_none() {
            return Err(Error::config_invalid(format!(
                "endpoint {endpoint} has no authority"
            )));
        }

        let region = region.into();
        let region = if region.is_empty() {
            DEFAULT_REGION.to_string()
        } else {
            region
        };

        Ok(Self {
            name: name.into(),
            region,
            endpoint,
        })
    }

    /// Create a service descriptor with the region taken from the
    /// `CLOUD_REGION` environment variable, defaulting to [`DEFAULT_REGION`].
    pub fn from_env_region(name: impl Into<String>, endpoint: &str) -> Result<Self> {
        let region = std::env::var(REGION_ENV_VAR).unwrap_or_default();
        Self::new(name, region, endpoint)
    }

    /// The service name used in the signing scope.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The region name used in the signing scope.
    pub fn region(&self) -> &str {
        &self.region
    }

    /// The service endpoint.
    pub fn endpoint(&self) -> &Uri {
        &self.endpoint
    }

    /// The endpoint host, as carried by the `Host` header.
    pub fn host(&self) -> &str {
        self.endpoint
            .authority()
            .expect("checked at construction")
            .as_str()
    }
}
