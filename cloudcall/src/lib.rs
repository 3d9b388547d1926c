#![doc = include_str!("../README.md")]

pub use cloudcall_core::*;

#[cfg(feature = "default-transport")]
pub use cloudcall_http_reqwest::{PoolConfig, ReqwestHttpSend};

#[cfg(feature = "autoscaling")]
pub mod autoscaling {
    pub use cloudcall_autoscaling::*;
}

#[cfg(feature = "dynamodb")]
pub mod dynamodb {
    pub use cloudcall_dynamodb::*;
}

#[cfg(feature = "s3")]
pub mod s3 {
    pub use cloudcall_s3::*;
}

/// Create a client with the default stack: credentials from the
/// `CLOUD_ACCESS_KEY_ID` / `CLOUD_SECRET_ACCESS_KEY` environment variables
/// and the reqwest-backed transport with default pool settings.
///
/// # Example
///
/// ```no_run
/// # fn main() -> cloudcall::Result<()> {
/// let client = cloudcall::default_client(
///     "s3",
///     "us-east-1",
///     "https://s3.amazonaws.com",
/// )?;
/// let s3 = cloudcall::s3::S3::new(client);
/// # Ok(())
/// # }
/// ```
#[cfg(feature = "default-transport")]
pub fn default_client(service: &str, region: &str, endpoint: &str) -> Result<Client> {
    use cloudcall_core::sigv4::Signer;

    let service = Service::new(service, region, endpoint)?;
    let credential = Credential::from_env("CLOUD_ACCESS_KEY_ID", "CLOUD_SECRET_ACCESS_KEY")?;
    Ok(Client::new(
        Signer::new(service, credential),
        ReqwestHttpSend::default(),
    ))
}
