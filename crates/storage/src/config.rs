use std::env;
use std::time::Duration;

use thiserror::Error;
use url::Url;

pub const DEFAULT_API_URL: &str = "http://localhost:8080/api/v1/";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("environment variable {0} is not set")]
    MissingEnv(&'static str),
    #[error("invalid API url {raw}: {reason}")]
    InvalidUrl { raw: String, reason: String },
    #[error("invalid timeout: {0}")]
    InvalidTimeout(String),
}

/// Where the remote store lives and how long to wait for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    base_url: Url,
    timeout: Duration,
}

impl ApiConfig {
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidUrl` unless `raw` is an absolute http(s) URL.
    pub fn new(raw: &str) -> Result<Self, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidUrl {
            raw: raw.to_owned(),
            reason,
        };
        let base_url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(invalid("scheme must be http or https".into()));
        }
        if base_url.cannot_be_a_base() {
            return Err(invalid("url cannot carry a path".into()));
        }
        Ok(Self {
            base_url,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        })
    }

    /// Reads `STUDY_API_URL` and `STUDY_API_TIMEOUT_SECS`, falling back to defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when a variable is set but malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let raw = env::var("STUDY_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.into());
        let config = Self::new(&raw)?;
        match env::var("STUDY_API_TIMEOUT_SECS") {
            Ok(secs) => {
                let secs: u64 = secs
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidTimeout(secs.clone()))?;
                if secs == 0 {
                    return Err(ConfigError::InvalidTimeout(secs.to_string()));
                }
                Ok(config.with_timeout(Duration::from_secs(secs)))
            }
            Err(_) => Ok(config),
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}
