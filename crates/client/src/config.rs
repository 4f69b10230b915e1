//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `TUTORHUB_API_BASE_URL` - Base URL of the platform API (e.g., <https://api.tutorhub.app/api/>)
//! - `TUTORHUB_STORAGE_PATH` - Path of the durable session store file
//!
//! ## Optional
//! - `TUTORHUB_REQUEST_TIMEOUT_SECS` - Per-request timeout (default: 30)
//! - `TUTORHUB_POLL_INTERVAL_SECS` - Pending-approval polling interval (default: 30)

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default interval between entitlement polls on the pending-approval step.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Default time-to-live for cached entitlement results.
pub const DEFAULT_ENTITLEMENT_CACHE_TTL: Duration = Duration::from_secs(30);

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Client SDK configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the platform API. Always normalized to a trailing slash so
    /// endpoint paths join underneath it instead of replacing its last segment.
    pub api_base_url: Url,
    /// Path of the durable session store file.
    pub storage_path: PathBuf,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// Interval between entitlement polls on the pending-approval step.
    pub poll_interval: Duration,
    /// Time-to-live for cached entitlement results.
    pub entitlement_cache_ttl: Duration,
}

impl ClientConfig {
    /// Create a configuration with default timeouts.
    #[must_use]
    pub fn new(api_base_url: Url, storage_path: impl Into<PathBuf>) -> Self {
        Self {
            api_base_url: ensure_trailing_slash(api_base_url),
            storage_path: storage_path.into(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            entitlement_cache_ttl: DEFAULT_ENTITLEMENT_CACHE_TTL,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or a value cannot
    /// be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = require_env("TUTORHUB_API_BASE_URL")?;
        let api_base_url = Url::parse(&base_url).map_err(|e| {
            ConfigError::InvalidEnvVar("TUTORHUB_API_BASE_URL".to_owned(), e.to_string())
        })?;

        let storage_path = PathBuf::from(require_env("TUTORHUB_STORAGE_PATH")?);

        let mut config = Self::new(api_base_url, storage_path);

        if let Some(secs) = optional_secs("TUTORHUB_REQUEST_TIMEOUT_SECS")? {
            config.request_timeout = secs;
        }
        if let Some(secs) = optional_secs("TUTORHUB_POLL_INTERVAL_SECS")? {
            config.poll_interval = secs;
        }

        Ok(config)
    }

    /// Override the polling interval (used by tests to poll fast).
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Override the entitlement cache TTL.
    #[must_use]
    pub const fn with_entitlement_cache_ttl(mut self, ttl: Duration) -> Self {
        self.entitlement_cache_ttl = ttl;
        self
    }
}

fn require_env(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_owned()))
}

fn optional_secs(name: &str) -> Result<Option<Duration>, ConfigError> {
    match std::env::var(name) {
        Ok(value) => {
            let secs: u64 = value
                .parse()
                .map_err(|_| ConfigError::InvalidEnvVar(name.to_owned(), value.clone()))?;
            Ok(Some(Duration::from_secs(secs)))
        }
        Err(_) => Ok(None),
    }
}

fn ensure_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
