//! Engine configuration
//!
//! Defines all configurable parameters for the worker: coordinator
//! connection and credentials, claim scope, idle polling interval, and
//! container retention for debugging.

use std::path::PathBuf;
use std::time::Duration;

/// Engine configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Unique identifier for this engine instance, sent in the User-Agent
    pub engine_id: String,

    /// Coordinator API base URL (e.g., "https://example.com/api")
    pub api_url: String,

    /// Path to a combined PEM client certificate + key, if the
    /// coordinator requires one
    pub ssl_cert: Option<PathBuf>,

    /// Verify the coordinator's TLS certificate
    pub verify_tls: bool,

    /// Group scope filter sent when claiming jobs
    pub group: Option<String>,

    /// Project scope filter sent when claiming jobs
    pub project: Option<String>,

    /// Host directory mounted read-only at /scratch in every container
    pub scratch_path: PathBuf,

    /// How long to sleep when no job is available
    pub poll_interval: Duration,

    /// Keep containers after the job finishes instead of removing them
    pub keep_containers: bool,
}

impl Config {
    /// Creates a new configuration with defaults for everything but the
    /// connection identity.
    pub fn new(engine_id: String, api_url: String) -> Self {
        Self {
            engine_id,
            api_url,
            ssl_cert: None,
            verify_tls: true,
            group: None,
            project: None,
            scratch_path: PathBuf::from("/scratch"),
            poll_interval: Duration::from_secs(10),
            keep_containers: false,
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables:
    /// - QUERN_API_URL (required)
    /// - QUERN_ENGINE_ID (optional, default: random UUID)
    /// - QUERN_SSL_CERT (optional, PEM path)
    /// - QUERN_NO_VERIFY (optional, "1"/"true" disables TLS verification)
    /// - QUERN_GROUP (optional claim scope)
    /// - QUERN_PROJECT (optional claim scope)
    /// - QUERN_SCRATCH_PATH (optional, default: /scratch)
    /// - QUERN_POLL_INTERVAL (optional, seconds, default: 10)
    /// - QUERN_KEEP_CONTAINERS (optional, "1"/"true" retains containers)
    pub fn from_env() -> anyhow::Result<Self> {
        let api_url = std::env::var("QUERN_API_URL")
            .map_err(|_| anyhow::anyhow!("QUERN_API_URL environment variable not set"))?;

        let engine_id = std::env::var("QUERN_ENGINE_ID")
            .unwrap_or_else(|_| uuid::Uuid::new_v4().to_string());

        let ssl_cert = std::env::var("QUERN_SSL_CERT").ok().map(PathBuf::from);

        let verify_tls = !flag_set("QUERN_NO_VERIFY");

        let group = std::env::var("QUERN_GROUP").ok();
        let project = std::env::var("QUERN_PROJECT").ok();

        let scratch_path = std::env::var("QUERN_SCRATCH_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/scratch"));

        let poll_interval = std::env::var("QUERN_POLL_INTERVAL")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(10));

        let keep_containers = flag_set("QUERN_KEEP_CONTAINERS");

        Ok(Self {
            engine_id,
            api_url,
            ssl_cert,
            verify_tls,
            group,
            project,
            scratch_path,
            poll_interval,
            keep_containers,
        })
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.engine_id.is_empty() {
            anyhow::bail!("engine_id cannot be empty");
        }

        if self.api_url.is_empty() {
            anyhow::bail!("api_url cannot be empty");
        }

        if !self.api_url.starts_with("http://") && !self.api_url.starts_with("https://") {
            anyhow::bail!("api_url must start with http:// or https://");
        }

        if self.poll_interval.as_secs() == 0 {
            anyhow::bail!("poll_interval must be greater than 0");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(
            uuid::Uuid::new_v4().to_string(),
            "https://localhost:8443/api".to_string(),
        )
    }
}

fn flag_set(name: &str) -> bool {
    std::env::var(name)
        .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.poll_interval, Duration::from_secs(10));
        assert_eq!(config.scratch_path, PathBuf::from("/scratch"));
        assert!(config.verify_tls);
        assert!(!config.keep_containers);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();

        assert!(config.validate().is_ok());

        config.engine_id = String::new();
        assert!(config.validate().is_err());

        config.engine_id = "test".to_string();

        config.api_url = "not-a-url".to_string();
        assert!(config.validate().is_err());

        config.api_url = "https://localhost:8443/api".to_string();
        assert!(config.validate().is_ok());

        config.poll_interval = Duration::from_secs(0);
        assert!(config.validate().is_err());
    }
}
