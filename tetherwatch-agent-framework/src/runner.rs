//! Agent runner for lifecycle management.

use std::future::Future;

use tetherwatch_common::{LoggingConfig, init_tracing};

use crate::AgentArgs;
use crate::config::AgentConfig;
use crate::error::{AgentError, Result};
use crate::signal::{ShutdownSignal, shutdown_channel, spawn_signal_listener};

/// Agent runner that manages the lifecycle of a telemetry agent.
///
/// Handles:
/// - Logging initialization (with optional CLI override)
/// - SIGINT/SIGTERM handling
/// - Handing the configuration and a [`ShutdownSignal`] to the worker
/// - Clean exit once the worker returns
///
/// # Example
///
/// ```ignore
/// use tetherwatch_agent_framework::{AgentArgs, AgentConfig, AgentRunner};
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let args = AgentArgs::parse();
///     let config = MyAgentConfig::resolve(args.config.as_deref())?;
///
///     let runner = AgentRunner::new_with_args("myagent", config, Some(&args))?;
///     runner
///         .run(|config, mut shutdown| async move {
///             // Worker logic here, returning once `shutdown.wait()` resolves
///         })
///         .await?;
///     Ok(())
/// }
/// ```
pub struct AgentRunner<C: AgentConfig> {
    /// Agent name for logging.
    name: String,
    /// Agent version.
    version: String,
    /// The loaded configuration.
    config: C,
}

impl<C: AgentConfig> AgentRunner<C> {
    /// Create a new agent runner and initialize logging from its config,
    /// with the CLI log level taking precedence when given.
    pub fn new_with_args(
        name: impl Into<String>,
        config: C,
        args: Option<&AgentArgs>,
    ) -> Result<Self> {
        let name = name.into();
        let version = env!("CARGO_PKG_VERSION").to_string();

        let log_config = match args.and_then(|a| a.log_level.as_ref()) {
            Some(level) => LoggingConfig {
                level: level.clone(),
                ..config.logging().clone()
            },
            None => config.logging().clone(),
        };

        init_tracing(&log_config).map_err(|e| AgentError::config(e.to_string()))?;

        tracing::info!(agent = %name, version = %version, "Starting agent");

        Ok(Self {
            name,
            version,
            config,
        })
    }

    /// Get the agent name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the agent version.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Get a reference to the configuration.
    pub fn config(&self) -> &C {
        &self.config
    }

    /// Run the worker until it returns.
    ///
    /// The worker receives the configuration by value and a
    /// [`ShutdownSignal`] that fires on SIGINT or SIGTERM. It is expected
    /// to return promptly once the signal fires.
    pub async fn run<F, Fut>(self, worker: F) -> Result<()>
    where
        F: FnOnce(C, ShutdownSignal) -> Fut,
        Fut: Future<Output = ()>,
    {
        let (trigger, shutdown) = shutdown_channel();
        let listener = spawn_signal_listener(trigger)?;

        tracing::info!(
            agent = %self.name,
            "Agent running. Send SIGINT or SIGTERM to stop."
        );

        worker(self.config, shutdown).await;

        listener.abort();

        tracing::info!(agent = %self.name, "Goodbye!");

        Ok(())
    }
}
