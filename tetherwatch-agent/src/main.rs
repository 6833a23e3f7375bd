//! tetherwatch agent.
//!
//! Pushes uptime, failover status and traffic metrics for USB-tethered
//! uplinks to a Prometheus remote-write endpoint.

use std::sync::Arc;

use anyhow::Result;
use tetherwatch_agent_framework::{AgentArgs, AgentConfig, AgentRunner};
use tetherwatch_exporter_remote_write::RemoteWriteClient;

use tetherwatch_agent::config::TetherAgentConfig;
use tetherwatch_agent::pipeline::{JsonLinesSink, MetricSink, Pipeline};
use tetherwatch_agent::scheduler::Scheduler;

const DEFAULT_CONFIG_PATH: &str = "/etc/tetherwatch/tetherwatch.json5";

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = AgentArgs::parse();

    // File (if any), then PUSH_* environment overrides, then validation
    let config = TetherAgentConfig::resolve(args.config_path(DEFAULT_CONFIG_PATH).as_deref())?;

    let runner = AgentRunner::new_with_args("tetherwatch", config, Some(&args))?;

    let sink: Arc<dyn MetricSink> = if args.dry_run {
        Arc::new(JsonLinesSink::new(std::io::stdout()))
    } else {
        Arc::new(RemoteWriteClient::new(&runner.config().remote_write)?)
    };

    let settings = &runner.config().agent;
    let scheduler = Scheduler::new(
        Pipeline::from_settings(settings, sink),
        settings.push_interval(),
    );

    tracing::info!(
        agent = %runner.name(),
        version = %runner.version(),
        url = %runner.config().remote_write.url,
        interval_secs = settings.push_interval_secs,
        device_prefix = %settings.device_prefix,
        traffic = settings.collect.traffic,
        device_labels = settings.collect.device_labels,
        dry_run = args.dry_run,
        "tetherwatch running"
    );

    let once = args.once;
    runner
        .run(move |_config, mut shutdown| async move {
            if once {
                match scheduler.run_once(&mut shutdown).await {
                    Some(report) => tracing::info!(?report, "Single cycle finished"),
                    None => tracing::info!("Shutdown before the cycle finished"),
                }
            } else {
                scheduler.run(shutdown).await;
            }
        })
        .await?;

    Ok(())
}
