//! Quern Coordinator Client
//!
//! Authenticated HTTP wrapper for the coordinator API, used by the engine
//! for every remote operation: claiming jobs, fetching build contexts,
//! staging inputs, submitting results, and reporting terminal status.
//!
//! Every request carries the `User-Agent: quern <engine-id>` header and,
//! when configured, a client certificate. TLS verification can be disabled
//! for coordinators running with self-signed certificates.
//!
//! # Example
//!
//! ```no_run
//! use quern_client::CoordinatorClient;
//! use quern_core::dto::job::ClaimFilter;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = CoordinatorClient::new("https://example.com/api", "engine-1")?;
//!
//!     match client.next_job(&ClaimFilter::default()).await? {
//!         Some(job) => println!("claimed job {}", job.id),
//!         None => println!("no work available"),
//!     }
//!     Ok(())
//! }
//! ```

pub mod error;
mod apps;
mod files;
mod jobs;

// Re-export commonly used types
pub use error::{ClientError, Result};

use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};

/// HTTP client for the coordinator API
///
/// One instance is shared by all pipeline stages; the client itself is
/// stateless apart from cached connection/credential configuration.
#[derive(Debug, Clone)]
pub struct CoordinatorClient {
    /// Base URL of the coordinator API (e.g., "https://example.com/api")
    base_url: String,
    /// HTTP client instance
    client: Client,
}

impl CoordinatorClient {
    /// Create a client without a certificate and with TLS verification on.
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the coordinator API
    /// * `engine_id` - Worker identity, sent in the `User-Agent` header
    pub fn new(base_url: impl Into<String>, engine_id: &str) -> Result<Self> {
        Self::with_tls(base_url, engine_id, None, true)
    }

    /// Create a client with an optional PEM client identity and an explicit
    /// TLS verification policy.
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the coordinator API
    /// * `engine_id` - Worker identity, sent in the `User-Agent` header
    /// * `identity_pem` - Combined certificate + private key, PEM encoded
    /// * `verify` - When false, accept invalid/self-signed server certificates
    pub fn with_tls(
        base_url: impl Into<String>,
        engine_id: &str,
        identity_pem: Option<&[u8]>,
        verify: bool,
    ) -> Result<Self> {
        let base_url = base_url.into();

        let mut headers = HeaderMap::new();
        let agent = format!("quern {engine_id}");
        let agent = HeaderValue::from_str(&agent)
            .map_err(|e| ClientError::Config(format!("invalid engine id for User-Agent: {e}")))?;
        headers.insert(USER_AGENT, agent);

        let mut builder = Client::builder()
            .default_headers(headers)
            .danger_accept_invalid_certs(!verify);

        if let Some(pem) = identity_pem {
            let identity = reqwest::Identity::from_pem(pem)
                .map_err(|e| ClientError::Config(format!("invalid client certificate: {e}")))?;
            builder = builder.identity(identity);
        }

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: builder.build()?,
        })
    }

    /// Get the base URL of the coordinator
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolve a coordinator-relative route against the base URL
    pub(crate) fn route_url(&self, route: &str) -> String {
        format!("{}/{}", self.base_url, route.trim_start_matches('/'))
    }

    /// Handle an API response that returns no useful body
    ///
    /// Checks the status code and returns an error carrying the status and
    /// body text if the request failed.
    pub(crate) async fn handle_empty_response(&self, response: reqwest::Response) -> Result<()> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(ClientError::api(status.as_u16(), error_text));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = CoordinatorClient::new("https://example.com/api", "engine-1").unwrap();
        assert_eq!(client.base_url(), "https://example.com/api");
    }

    #[test]
    fn test_client_trims_trailing_slash() {
        let client = CoordinatorClient::new("https://example.com/api/", "engine-1").unwrap();
        assert_eq!(client.base_url(), "https://example.com/api");
    }

    #[test]
    fn test_route_url_joins_relative_routes() {
        let client = CoordinatorClient::new("https://example.com/api", "engine-1").unwrap();
        assert_eq!(
            client.route_url("files/dicom"),
            "https://example.com/api/files/dicom"
        );
        assert_eq!(
            client.route_url("/files/dicom"),
            "https://example.com/api/files/dicom"
        );
    }

    #[test]
    fn test_rejects_unprintable_engine_id() {
        assert!(CoordinatorClient::new("https://example.com/api", "bad\nid").is_err());
    }
}
