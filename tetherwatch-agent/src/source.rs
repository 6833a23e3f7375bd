//! Data sources feeding a collection cycle.
//!
//! Each source is a trait with a single query so the pipeline can run
//! against canned data in tests. [`SystemSources`] implements all of them
//! by running the router's diagnostic commands.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, trace};

use crate::model::{FailoverStatusRecord, InterfaceRecord, TrafficTable};
use crate::traffic::parse_counters;

/// Longest stderr excerpt kept in a [`SourceError::ExitStatus`].
const MAX_STDERR: usize = 256;

/// Errors returned by a data source.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Failed to run '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{program}' exited with {}: {stderr}", exit_code(.code))]
    ExitStatus {
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("'{program}' did not finish within {timeout_secs}s")]
    Timeout { program: String, timeout_secs: u64 },

    #[error("Failed to decode output of '{program}': {source}")]
    Decode {
        program: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("No device description for interface '{interface}'")]
    EmptyLabel { interface: String },
}

fn exit_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {}", code),
        None => "a signal".to_string(),
    }
}

/// Interface inventory (`ifdev`).
#[async_trait]
pub trait InventorySource: Send + Sync {
    async fn interfaces(&self) -> Result<Vec<InterfaceRecord>, SourceError>;
}

/// Failover status report (`mwan3ifstatus`).
#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn statuses(&self) -> Result<Vec<FailoverStatusRecord>, SourceError>;
}

/// Per-device byte counters (`ifconfig`).
#[async_trait]
pub trait TrafficSource: Send + Sync {
    async fn counters(&self) -> Result<TrafficTable, SourceError>;
}

/// Human-readable device name for an interface (`ifusb <interface>`).
#[async_trait]
pub trait LabelSource: Send + Sync {
    /// Returns a non-empty label or an error.
    async fn device_label(&self, interface_name: &str) -> Result<String, SourceError>;
}

/// An external command and its fixed arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    pub program: String,

    #[serde(default)]
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }
}

/// Commands backing each source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandsConfig {
    #[serde(default = "default_inventory")]
    pub inventory: CommandSpec,

    #[serde(default = "default_status")]
    pub status: CommandSpec,

    #[serde(default = "default_traffic")]
    pub traffic: CommandSpec,

    #[serde(default = "default_device_label")]
    pub device_label: CommandSpec,
}

fn default_inventory() -> CommandSpec {
    CommandSpec::new("ifdev")
}

fn default_status() -> CommandSpec {
    CommandSpec::new("mwan3ifstatus")
}

fn default_traffic() -> CommandSpec {
    CommandSpec::new("ifconfig")
}

fn default_device_label() -> CommandSpec {
    CommandSpec::new("ifusb")
}

impl Default for CommandsConfig {
    fn default() -> Self {
        Self {
            inventory: default_inventory(),
            status: default_status(),
            traffic: default_traffic(),
            device_label: default_device_label(),
        }
    }
}

/// Response of the device label command.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DeviceDescription {
    description: Option<String>,
}

/// All four sources backed by local commands.
///
/// Every invocation is bounded by `timeout`; a command still running when
/// its future is dropped is killed.
#[derive(Debug, Clone)]
pub struct SystemSources {
    commands: CommandsConfig,
    timeout: Duration,
}

impl SystemSources {
    pub fn new(commands: CommandsConfig, timeout: Duration) -> Self {
        Self { commands, timeout }
    }

    /// Run a command and return its stdout.
    async fn run(&self, spec: &CommandSpec, extra_args: &[&str]) -> Result<Vec<u8>, SourceError> {
        trace!(program = %spec.program, args = ?spec.args, ?extra_args, "Running command");

        let mut command = Command::new(&spec.program);
        command
            .args(&spec.args)
            .args(extra_args)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| SourceError::Timeout {
                program: spec.program.clone(),
                timeout_secs: self.timeout.as_secs(),
            })?
            .map_err(|source| SourceError::Spawn {
                program: spec.program.clone(),
                source,
            })?;

        if !output.status.success() {
            let mut stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            if stderr.len() > MAX_STDERR {
                let mut cut = MAX_STDERR;
                while !stderr.is_char_boundary(cut) {
                    cut -= 1;
                }
                stderr.truncate(cut);
            }
            return Err(SourceError::ExitStatus {
                program: spec.program.clone(),
                code: output.status.code(),
                stderr,
            });
        }

        debug!(program = %spec.program, bytes = output.stdout.len(), "Command finished");
        Ok(output.stdout)
    }

    async fn run_json_list<T: DeserializeOwned>(
        &self,
        spec: &CommandSpec,
    ) -> Result<Vec<T>, SourceError> {
        let stdout = self.run(spec, &[]).await?;
        decode_list(&spec.program, &stdout)
    }
}

/// Decode a JSON array, treating a `null` document as empty.
pub(crate) fn decode_list<T: DeserializeOwned>(
    program: &str,
    bytes: &[u8],
) -> Result<Vec<T>, SourceError> {
    serde_json::from_slice::<Option<Vec<T>>>(bytes)
        .map(Option::unwrap_or_default)
        .map_err(|source| SourceError::Decode {
            program: program.to_string(),
            source,
        })
}

/// Decode a `{"description": ...}` response into a label.
pub(crate) fn decode_label(
    program: &str,
    interface_name: &str,
    bytes: &[u8],
) -> Result<String, SourceError> {
    let response: Option<DeviceDescription> =
        serde_json::from_slice(bytes).map_err(|source| SourceError::Decode {
            program: program.to_string(),
            source,
        })?;

    response
        .and_then(|r| r.description)
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
        .ok_or_else(|| SourceError::EmptyLabel {
            interface: interface_name.to_string(),
        })
}

#[async_trait]
impl InventorySource for SystemSources {
    async fn interfaces(&self) -> Result<Vec<InterfaceRecord>, SourceError> {
        self.run_json_list(&self.commands.inventory).await
    }
}

#[async_trait]
impl StatusSource for SystemSources {
    async fn statuses(&self) -> Result<Vec<FailoverStatusRecord>, SourceError> {
        self.run_json_list(&self.commands.status).await
    }
}

#[async_trait]
impl TrafficSource for SystemSources {
    async fn counters(&self) -> Result<TrafficTable, SourceError> {
        let stdout = self.run(&self.commands.traffic, &[]).await?;
        Ok(parse_counters(&String::from_utf8_lossy(&stdout)))
    }
}

#[async_trait]
impl LabelSource for SystemSources {
    async fn device_label(&self, interface_name: &str) -> Result<String, SourceError> {
        let spec = &self.commands.device_label;
        let stdout = self.run(spec, &[interface_name]).await?;
        decode_label(&spec.program, interface_name, &stdout)
    }
}
