//! tetherwatch Agent Framework
//!
//! Common plumbing for periodic telemetry agents.
//!
//! # Overview
//!
//! This framework provides:
//! - [`AgentConfig`] trait for configuration loading, environment overrides and validation
//! - [`AgentRunner`] for managing agent lifecycle (logging, signal handling, shutdown)
//! - [`ShutdownSignal`] for observing shutdown from inside a worker
//! - [`AgentArgs`] for common CLI argument parsing
//!
//! # Example
//!
//! ```ignore
//! use tetherwatch_agent_framework::{AgentArgs, AgentConfig, AgentRunner};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = AgentArgs::parse();
//!     let config = MyAgentConfig::resolve(args.config_path("/etc/myagent.json5").as_deref())?;
//!
//!     let runner = AgentRunner::new_with_args("myagent", config, Some(&args))?;
//!
//!     // Run until SIGINT/SIGTERM
//!     runner.run(|config, shutdown| my_loop(config, shutdown)).await?;
//!     Ok(())
//! }
//! ```

mod args;
mod config;
mod error;
mod runner;
mod signal;

pub use args::AgentArgs;
pub use config::{AgentConfig, EnvLookup};
pub use error::{AgentError, Result};
pub use runner::AgentRunner;
pub use signal::{ShutdownSignal, ShutdownTrigger, shutdown_channel};

// Re-export commonly used types from tetherwatch-common
pub use tetherwatch_common::{LogFormat, LoggingConfig, MetricPoint};
