//! Configuration traits and utilities.

use std::path::Path;

use serde::de::DeserializeOwned;

use crate::LoggingConfig;
use crate::error::{AgentError, Result};

/// Environment variable lookup used for configuration overrides.
pub type EnvLookup<'a> = &'a dyn Fn(&str) -> Option<String>;

/// Trait for agent configuration types.
///
/// Implement this trait for your agent's configuration struct to get
/// file loading, environment overrides and validation in one place.
///
/// # Example
///
/// ```ignore
/// use serde::Deserialize;
/// use tetherwatch_agent_framework::{AgentConfig, AgentError, EnvLookup, LoggingConfig};
///
/// #[derive(Debug, Default, Deserialize)]
/// pub struct MyAgentConfig {
///     #[serde(default)]
///     pub logging: LoggingConfig,
///     #[serde(default)]
///     pub endpoint: String,
/// }
///
/// impl AgentConfig for MyAgentConfig {
///     fn logging(&self) -> &LoggingConfig {
///         &self.logging
///     }
///
///     fn apply_env(&mut self, env: EnvLookup<'_>) -> Result<(), AgentError> {
///         if let Some(url) = env("MY_ENDPOINT") {
///             self.endpoint = url;
///         }
///         Ok(())
///     }
///
///     fn validate(&self) -> Result<(), AgentError> {
///         if self.endpoint.is_empty() {
///             return Err(AgentError::validation("endpoint is required"));
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait AgentConfig: Sized + DeserializeOwned + Default {
    /// Get the logging configuration.
    fn logging(&self) -> &LoggingConfig;

    /// Apply overrides from the environment.
    ///
    /// Called after the file (or defaults) is loaded and before validation.
    fn apply_env(&mut self, _env: EnvLookup<'_>) -> Result<()> {
        Ok(())
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<()> {
        Ok(())
    }

    /// Load configuration from a JSON5 file without validating it.
    fn load_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(AgentError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path)?;
        let config: Self = json5::from_str(&content)?;

        Ok(config)
    }

    /// Build the effective configuration from an optional file and an
    /// environment lookup, then validate it.
    fn resolve_with(path: Option<&Path>, env: EnvLookup<'_>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load_file(path)?,
            None => Self::default(),
        };

        config.apply_env(env)?;
        config.validate()?;

        Ok(config)
    }

    /// Build the effective configuration from an optional file and the
    /// process environment.
    fn resolve(path: Option<&Path>) -> Result<Self> {
        Self::resolve_with(path, &|key: &str| std::env::var(key).ok())
    }
}
