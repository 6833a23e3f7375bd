//! Configuration for the remote-write pusher.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Remote-write endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteWriteConfig {
    /// Receiver URL (e.g., "https://prometheus.example/api/v1/write").
    #[serde(default)]
    pub url: String,

    /// HTTP basic auth username. Auth is sent when this or the password is set.
    #[serde(default)]
    pub username: Option<String>,

    /// HTTP basic auth password.
    #[serde(default)]
    pub password: Option<String>,

    /// Request timeout in seconds (default: 60).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Labels added to every series unless the point already carries them.
    #[serde(default)]
    pub external_labels: BTreeMap<String, String>,
}

fn default_timeout() -> u64 {
    60
}

impl Default for RemoteWriteConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            username: None,
            password: None,
            timeout_secs: default_timeout(),
            external_labels: BTreeMap::new(),
        }
    }
}

impl RemoteWriteConfig {
    /// Request timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Basic auth credentials, if any.
    ///
    /// Empty strings count as unset. A password alone is sent with an empty
    /// username.
    pub fn basic_auth(&self) -> Option<(&str, Option<&str>)> {
        let username = self.username.as_deref().filter(|u| !u.is_empty());
        let password = self.password.as_deref().filter(|p| !p.is_empty());

        match (username, password) {
            (None, None) => None,
            (username, password) => Some((username.unwrap_or(""), password)),
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.url.trim().is_empty() {
            return Err(ConfigError::Validation(
                "remote_write.url must be set".to_string(),
            ));
        }

        let url = reqwest::Url::parse(&self.url).map_err(|e| {
            ConfigError::Validation(format!("Invalid remote_write.url '{}': {}", self.url, e))
        })?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::Validation(format!(
                "remote_write.url must be http or https, got '{}'",
                url.scheme()
            )));
        }

        if self.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "remote_write.timeout_secs must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}
