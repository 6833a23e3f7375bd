//! Configuration for the tetherwatch agent.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use tetherwatch_agent_framework::{AgentConfig, AgentError, EnvLookup, LoggingConfig, Result};
use tetherwatch_exporter_remote_write::RemoteWriteConfig;

use crate::metrics::DEFAULT_METRIC_PREFIX;
use crate::model::DEFAULT_TETHER_PREFIX;
use crate::source::CommandsConfig;

/// Push interval override, in whole seconds.
pub const ENV_PUSH_INTERVAL: &str = "PUSH_INTERVAL_SECONDS";
/// Remote-write URL override.
pub const ENV_PUSH_URL: &str = "PUSH_URL";
/// Basic auth username override.
pub const ENV_PUSH_USERNAME: &str = "PUSH_USERNAME";
/// Basic auth password override.
pub const ENV_PUSH_PASSWORD: &str = "PUSH_PASSWORD";

/// Longest accepted push interval (one day).
pub const MAX_PUSH_INTERVAL_SECS: u64 = 86_400;

/// Complete agent configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TetherAgentConfig {
    /// Collection settings.
    #[serde(default)]
    pub agent: AgentSettings,

    /// Remote-write endpoint.
    #[serde(default)]
    pub remote_write: RemoteWriteConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Collection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSettings {
    /// Seconds between cycles. Must be set, here or through
    /// `PUSH_INTERVAL_SECONDS`.
    #[serde(default)]
    pub push_interval_secs: u64,

    /// Metric name prefix (default: "tether_iface").
    #[serde(default = "default_metric_prefix")]
    pub metric_prefix: String,

    /// Device name prefix of tethered modems (default: "usb").
    #[serde(default = "default_device_prefix")]
    pub device_prefix: String,

    /// Per-command timeout in seconds (default: 10).
    #[serde(default = "default_command_timeout")]
    pub command_timeout_secs: u64,

    /// Optional collection steps.
    #[serde(default)]
    pub collect: CollectConfig,

    /// Commands backing each data source.
    #[serde(default)]
    pub commands: CommandsConfig,
}

fn default_metric_prefix() -> String {
    DEFAULT_METRIC_PREFIX.to_string()
}

fn default_device_prefix() -> String {
    DEFAULT_TETHER_PREFIX.to_string()
}

fn default_command_timeout() -> u64 {
    10
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            push_interval_secs: 0,
            metric_prefix: default_metric_prefix(),
            device_prefix: default_device_prefix(),
            command_timeout_secs: default_command_timeout(),
            collect: CollectConfig::default(),
            commands: CommandsConfig::default(),
        }
    }
}

impl AgentSettings {
    pub fn push_interval(&self) -> Duration {
        Duration::from_secs(self.push_interval_secs)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }
}

/// Steps that can be turned off.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectConfig {
    /// Collect byte counters and emit `tx`/`rx` (default: true).
    #[serde(default = "default_true")]
    pub traffic: bool,

    /// Resolve device descriptions for the `device` label (default: true).
    /// When off, the kernel device name is used.
    #[serde(default = "default_true")]
    pub device_labels: bool,
}

impl Default for CollectConfig {
    fn default() -> Self {
        Self {
            traffic: true,
            device_labels: true,
        }
    }
}

fn default_true() -> bool {
    true
}

impl AgentConfig for TetherAgentConfig {
    fn logging(&self) -> &LoggingConfig {
        &self.logging
    }

    fn apply_env(&mut self, env: EnvLookup<'_>) -> Result<()> {
        let get = |key: &str| env(key).filter(|v| !v.is_empty());

        if let Some(interval) = get(ENV_PUSH_INTERVAL) {
            self.agent.push_interval_secs = interval.trim().parse().map_err(|_| {
                AgentError::validation(format!(
                    "{} must be a whole number of seconds, got '{}'",
                    ENV_PUSH_INTERVAL, interval
                ))
            })?;
        }

        if let Some(url) = get(ENV_PUSH_URL) {
            self.remote_write.url = url;
        }

        if let Some(username) = get(ENV_PUSH_USERNAME) {
            self.remote_write.username = Some(username);
        }

        if let Some(password) = get(ENV_PUSH_PASSWORD) {
            self.remote_write.password = Some(password);
        }

        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.agent.push_interval_secs == 0 {
            return Err(AgentError::validation(format!(
                "agent.push_interval_secs (or {}) must be > 0",
                ENV_PUSH_INTERVAL
            )));
        }

        if self.agent.push_interval_secs > MAX_PUSH_INTERVAL_SECS {
            return Err(AgentError::validation(format!(
                "agent.push_interval_secs (or {}) must be <= {}, got {}",
                ENV_PUSH_INTERVAL, MAX_PUSH_INTERVAL_SECS, self.agent.push_interval_secs
            )));
        }

        if self.agent.command_timeout_secs == 0 {
            return Err(AgentError::validation(
                "agent.command_timeout_secs must be > 0",
            ));
        }

        if self.agent.metric_prefix.trim().is_empty() {
            return Err(AgentError::validation("agent.metric_prefix must not be empty"));
        }

        if self.agent.device_prefix.trim().is_empty() {
            return Err(AgentError::validation("agent.device_prefix must not be empty"));
        }

        let commands = &self.agent.commands;
        for (name, spec) in [
            ("inventory", &commands.inventory),
            ("status", &commands.status),
            ("traffic", &commands.traffic),
            ("device_label", &commands.device_label),
        ] {
            if spec.program.trim().is_empty() {
                return Err(AgentError::validation(format!(
                    "agent.commands.{}.program must not be empty",
                    name
                )));
            }
        }

        self.remote_write
            .validate()
            .map_err(|e| AgentError::validation(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(vars: &[(&str, &str)]) -> HashMap<String, String> {
        vars.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn resolve(
        json: Option<&str>,
        vars: &[(&str, &str)],
    ) -> std::result::Result<TetherAgentConfig, AgentError> {
        let vars = env(vars);
        let lookup = |key: &str| vars.get(key).cloned();

        match json {
            Some(json) => {
                let mut file = tempfile::NamedTempFile::new().unwrap();
                file.write_all(json.as_bytes()).unwrap();
                TetherAgentConfig::resolve_with(Some(file.path()), &lookup)
            }
            None => TetherAgentConfig::resolve_with(None, &lookup),
        }
    }

    #[test]
    fn test_parse_minimal_config() {
        let config = resolve(
            Some(
                r#"{
                    agent: { push_interval_secs: 30 },
                    remote_write: { url: "http://localhost:9090/api/v1/write" },
                }"#,
            ),
            &[],
        )
        .unwrap();

        assert_eq!(config.agent.push_interval(), Duration::from_secs(30));
        assert_eq!(config.agent.metric_prefix, "tether_iface");
        assert_eq!(config.agent.device_prefix, "usb");
        assert_eq!(config.agent.command_timeout(), Duration::from_secs(10));
        assert!(config.agent.collect.traffic);
        assert!(config.agent.collect.device_labels);
        assert_eq!(config.agent.commands.status.program, "mwan3ifstatus");
        assert_eq!(config.remote_write.timeout_secs, 60);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_parse_full_config() {
        let config = resolve(
            Some(
                r#"{
                    agent: {
                        push_interval_secs: 15,
                        metric_prefix: "lte",
                        device_prefix: "wwan",
                        command_timeout_secs: 3,
                        collect: { traffic: false, device_labels: false },
                        commands: {
                            inventory: { program: "/usr/sbin/ifdev", args: ["--json"] },
                        },
                    },
                    remote_write: {
                        url: "https://metrics.example/api/v1/write",
                        username: "agent",
                        password: "secret",
                    },
                    logging: { level: "debug", format: "json" },
                }"#,
            ),
            &[],
        )
        .unwrap();

        assert_eq!(config.agent.metric_prefix, "lte");
        assert_eq!(config.agent.device_prefix, "wwan");
        assert!(!config.agent.collect.traffic);
        assert!(!config.agent.collect.device_labels);
        assert_eq!(config.agent.commands.inventory.program, "/usr/sbin/ifdev");
        assert_eq!(config.agent.commands.inventory.args, vec!["--json"]);
        assert_eq!(config.agent.commands.traffic.program, "ifconfig");
        assert_eq!(config.remote_write.basic_auth(), Some(("agent", Some("secret"))));
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_env_only() {
        let config = resolve(
            None,
            &[
                (ENV_PUSH_INTERVAL, "60"),
                (ENV_PUSH_URL, "https://metrics.example/api/v1/write"),
                (ENV_PUSH_USERNAME, "router"),
                (ENV_PUSH_PASSWORD, "secret"),
            ],
        )
        .unwrap();

        assert_eq!(config.agent.push_interval_secs, 60);
        assert_eq!(config.remote_write.url, "https://metrics.example/api/v1/write");
        assert_eq!(config.remote_write.username.as_deref(), Some("router"));
        assert_eq!(config.remote_write.password.as_deref(), Some("secret"));
    }

    #[test]
    fn test_env_overrides_file() {
        let config = resolve(
            Some(
                r#"{
                    agent: { push_interval_secs: 30 },
                    remote_write: { url: "http://file.example/write" },
                }"#,
            ),
            &[(ENV_PUSH_INTERVAL, "5"), (ENV_PUSH_URL, "http://env.example/write")],
        )
        .unwrap();

        assert_eq!(config.agent.push_interval_secs, 5);
        assert_eq!(config.remote_write.url, "http://env.example/write");
    }

    #[test]
    fn test_empty_env_is_ignored() {
        let config = resolve(
            Some(
                r#"{
                    agent: { push_interval_secs: 30 },
                    remote_write: { url: "http://file.example/write" },
                }"#,
            ),
            &[(ENV_PUSH_URL, ""), (ENV_PUSH_INTERVAL, "")],
        )
        .unwrap();

        assert_eq!(config.remote_write.url, "http://file.example/write");
        assert_eq!(config.agent.push_interval_secs, 30);
    }

    #[test]
    fn test_non_integer_interval() {
        let err = resolve(
            None,
            &[(ENV_PUSH_INTERVAL, "1.5"), (ENV_PUSH_URL, "http://localhost/write")],
        )
        .unwrap_err();

        assert!(matches!(err, AgentError::ConfigValidation(_)));
        assert!(err.to_string().contains(ENV_PUSH_INTERVAL));
    }

    #[test]
    fn test_interval_too_large() {
        let err = resolve(
            None,
            &[
                (ENV_PUSH_INTERVAL, "18446744073709551615"),
                (ENV_PUSH_URL, "http://localhost/write"),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, AgentError::ConfigValidation(_)));
        assert!(err.to_string().contains("must be <= 86400"), "{err}");

        let config = resolve(
            None,
            &[(ENV_PUSH_INTERVAL, "86400"), (ENV_PUSH_URL, "http://localhost/write")],
        )
        .unwrap();
        assert_eq!(config.agent.push_interval(), Duration::from_secs(MAX_PUSH_INTERVAL_SECS));
    }

    #[test]
    fn test_password_only_credentials() {
        let config = resolve(
            None,
            &[
                (ENV_PUSH_INTERVAL, "30"),
                (ENV_PUSH_URL, "http://localhost/write"),
                (ENV_PUSH_PASSWORD, "tok"),
            ],
        )
        .unwrap();
        assert_eq!(config.remote_write.basic_auth(), Some(("", Some("tok"))));
    }

    #[test]
    fn test_empty_device_prefix() {
        for prefix in ["", "  "] {
            let json = format!(
                r#"{{
                    agent: {{ push_interval_secs: 30, device_prefix: "{prefix}" }},
                    remote_write: {{ url: "http://localhost/write" }},
                }}"#
            );
            let err = resolve(Some(json.as_str()), &[]).unwrap_err();
            assert!(err.to_string().contains("agent.device_prefix"), "{err}");
        }
    }

    #[test]
    fn test_missing_interval() {
        let err = resolve(None, &[(ENV_PUSH_URL, "http://localhost/write")]).unwrap_err();
        assert!(matches!(err, AgentError::ConfigValidation(_)));
    }

    #[test]
    fn test_missing_url() {
        let err = resolve(None, &[(ENV_PUSH_INTERVAL, "30")]).unwrap_err();
        assert!(err.to_string().contains("remote_write.url"));
    }

    #[test]
    fn test_zero_command_timeout() {
        let err = resolve(
            Some(
                r#"{
                    agent: { push_interval_secs: 30, command_timeout_secs: 0 },
                    remote_write: { url: "http://localhost/write" },
                }"#,
            ),
            &[],
        )
        .unwrap_err();
        assert!(err.to_string().contains("command_timeout_secs"));
    }

    #[test]
    fn test_empty_program() {
        let err = resolve(
            Some(
                r#"{
                    agent: { push_interval_secs: 30, commands: { status: { program: "" } } },
                    remote_write: { url: "http://localhost/write" },
                }"#,
            ),
            &[],
        )
        .unwrap_err();
        assert!(err.to_string().contains("commands.status"));
    }

    #[test]
    fn test_missing_file() {
        let err = TetherAgentConfig::resolve_with(
            Some(std::path::Path::new("/nonexistent/tetherwatch.json5")),
            &|_: &str| -> Option<String> { None },
        )
        .unwrap_err();
        assert!(matches!(err, AgentError::ConfigNotFound { .. }));
    }
}
