//! CLI argument parsing for agents.

use std::path::{Path, PathBuf};

use clap::Parser;

/// Common CLI arguments for all agents.
#[derive(Parser, Debug, Clone, Default)]
#[command(about = "tetherwatch telemetry agent", version)]
pub struct AgentArgs {
    /// Path to configuration file (JSON5 format).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Run a single collection cycle and exit.
    #[arg(long)]
    pub once: bool,

    /// Print metrics to stdout instead of pushing them.
    #[arg(long)]
    pub dry_run: bool,
}

impl AgentArgs {
    /// Parse CLI arguments.
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    /// Configuration file to load.
    ///
    /// An explicit `--config` always wins. Otherwise `default_path` is used
    /// if it exists, and `None` means "defaults plus environment only".
    pub fn config_path(&self, default_path: impl AsRef<Path>) -> Option<PathBuf> {
        if let Some(ref path) = self.config {
            return Some(path.clone());
        }

        let default_path = default_path.as_ref();
        default_path.exists().then(|| default_path.to_path_buf())
    }
}
