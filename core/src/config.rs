//! Client configuration: base URL and application credentials.

use crate::error::ThunderError;
use crate::http::BasicAuth;

pub const ENV_BASE_URL: &str = "THUNDER_BASE_URL";
pub const ENV_APPLICATION_KEY: &str = "THUNDER_APPLICATION_KEY";
pub const ENV_APPLICATION_SECRET: &str = "THUNDER_APPLICATION_SECRET";

/// Immutable connection settings shared by every request a client builds.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    base_url: String,
    credentials: BasicAuth,
}

impl ClientConfig {
    /// Validates and stores the configuration. A trailing `/` on `base_url`
    /// is dropped.
    pub fn new(
        base_url: &str,
        application_key: &str,
        application_secret: &str,
    ) -> Result<Self, ThunderError> {
        let base_url = base_url.trim().trim_end_matches('/');
        if base_url.is_empty() {
            return Err(ThunderError::Config("base URL is empty".to_string()));
        }
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ThunderError::Config(format!(
                "base URL {base_url} must start with http:// or https://"
            )));
        }
        if application_key.is_empty() {
            return Err(ThunderError::Config("application key is empty".to_string()));
        }
        if application_secret.is_empty() {
            return Err(ThunderError::Config(
                "application secret is empty".to_string(),
            ));
        }
        Ok(Self {
            base_url: base_url.to_string(),
            credentials: BasicAuth::new(application_key, application_secret),
        })
    }

    /// Reads `THUNDER_BASE_URL`, `THUNDER_APPLICATION_KEY` and
    /// `THUNDER_APPLICATION_SECRET`.
    pub fn from_env() -> Result<Self, ThunderError> {
        let base_url = require_env(ENV_BASE_URL)?;
        let key = require_env(ENV_APPLICATION_KEY)?;
        let secret = require_env(ENV_APPLICATION_SECRET)?;
        Self::new(&base_url, &key, &secret)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn application_key(&self) -> &str {
        &self.credentials.username
    }

    pub fn credentials(&self) -> &BasicAuth {
        &self.credentials
    }
}

fn require_env(name: &str) -> Result<String, ThunderError> {
    std::env::var(name).map_err(|_| ThunderError::Config(format!("{name} is not set")))
}
