use std::fmt::{Debug, Formatter};

use ini::Ini;

use crate::utils::Redact;
use crate::{Error, Result};

/// Properties-file key for the access key identifier.
const PROP_ACCESS_KEY_ID: &str = "access_key_id";
/// Properties-file key for the secret key.
const PROP_SECRET_ACCESS_KEY: &str = "secret_access_key";

/// Credential that holds the access key id and secret key.
///
/// The pair is immutable for its whole lifetime; rotation and refresh are
/// not supported.
#[derive(Clone)]
pub struct Credential {
    access_key_id: String,
    secret_access_key: String,
}

impl Debug for Credential {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("access_key_id", &Redact::from(&self.access_key_id))
            .field("secret_access_key", &Redact::from(&self.secret_access_key))
            .finish()
    }
}

impl Credential {
    /// Create a credential from an explicit pair.
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
        }
    }

    /// Load a credential from two named environment variables.
    ///
    /// Either variable missing or empty fails construction.
    pub fn from_env(id_var: &str, secret_var: &str) -> Result<Self> {
        let access_key_id = std::env::var(id_var)
            .map_err(|_| Error::config_invalid(format!("env var {id_var} is not set")))?;
        let secret_access_key = std::env::var(secret_var)
            .map_err(|_| Error::config_invalid(format!("env var {secret_var} is not set")))?;

        if access_key_id.is_empty() || secret_access_key.is_empty() {
            return Err(Error::config_invalid(format!(
                "env vars {id_var}/{secret_var} must not be empty"
            )));
        }

        Ok(Self {
            access_key_id,
            secret_access_key,
        })
    }

    /// Load a credential from a properties file.
    ///
    /// The file is `key=value` pairs, either at top level or under a
    /// `[default]` section:
    ///
    /// ```text
    /// access_key_id = AKIDEXAMPLE
    /// secret_access_key = wJalrXUtnFEMI...
    /// ```
    pub fn from_properties_file(path: &str) -> Result<Self> {
        let conf = Ini::load_from_file(path).map_err(|e| {
            Error::config_invalid(format!("cannot read properties file {path}: {e}"))
        })?;

        let lookup = |key: &str| {
            conf.general_section()
                .get(key)
                .or_else(|| conf.section(Some("default")).and_then(|s| s.get(key)))
                .map(str::to_string)
        };

        let access_key_id = lookup(PROP_ACCESS_KEY_ID).ok_or_else(|| {
            Error::config_invalid(format!("{path} is missing {PROP_ACCESS_KEY_ID}"))
        })?;
        let secret_access_key = lookup(PROP_SECRET_ACCESS_KEY).ok_or_else(|| {
            Error::config_invalid(format!("{path} is missing {PROP_SECRET_ACCESS_KEY}"))
        })?;

        Ok(Self {
            access_key_id,
            secret_access_key,
        })
    }

    /// The access key identifier.
    pub fn access_key_id(&self) -> &str {
        &self.access_key_id
    }

    /// The secret key.
    pub fn secret_access_key(&self) -> &str {
        &self.secret_access_key
    }
}
