//! One collection cycle from sources to sink.

use std::io::Write;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info, warn};

use tetherwatch_common::{MetricPoint, current_timestamp_millis};
use tetherwatch_exporter_remote_write::{PushError, RemoteWriteClient};

use crate::collector::Collector;
use crate::config::AgentSettings;
use crate::merge::merge;
use crate::metrics::MetricBuilder;
use crate::source::SystemSources;

/// Errors from a [`MetricSink`].
#[derive(Debug, Error)]
pub enum SinkError {
    #[error(transparent)]
    Push(#[from] PushError),

    #[error("Failed to encode metric: {0}")]
    Encode(#[from] tetherwatch_common::Error),

    #[error("Failed to write metrics: {0}")]
    Io(#[from] std::io::Error),

    #[error("Metric output is unavailable")]
    Poisoned,
}

/// Destination for the points of one cycle.
#[async_trait]
pub trait MetricSink: Send + Sync {
    /// Deliver the whole batch. Returns the number of points accepted.
    async fn write(&self, points: &[MetricPoint]) -> Result<usize, SinkError>;
}

#[async_trait]
impl MetricSink for RemoteWriteClient {
    async fn write(&self, points: &[MetricPoint]) -> Result<usize, SinkError> {
        let summary = self.push(points).await?;
        Ok(summary.series)
    }
}

/// Writes each point as a JSON line instead of pushing it.
#[derive(Debug)]
pub struct JsonLinesSink<W> {
    out: Mutex<W>,
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> Option<W> {
        self.out.into_inner().ok()
    }
}

#[async_trait]
impl<W: Write + Send> MetricSink for JsonLinesSink<W> {
    async fn write(&self, points: &[MetricPoint]) -> Result<usize, SinkError> {
        let mut out = self.out.lock().map_err(|_| SinkError::Poisoned)?;
        for point in points {
            writeln!(out, "{}", point.to_json_line()?)?;
        }
        out.flush()?;
        Ok(points.len())
    }
}

/// Outcome of one cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Interfaces present in both inventory and status.
    pub records: usize,
    /// Records dropped because their device label could not be resolved.
    pub skipped: usize,
    /// Points built this cycle.
    pub points: usize,
    /// Collection steps that failed.
    pub step_errors: usize,
    /// Points accepted by the sink; zero when nothing was sent or the
    /// write failed.
    pub pushed: usize,
    /// The sink rejected the batch.
    pub push_failed: bool,
}

/// Collector, metric builder and sink wired together.
pub struct Pipeline {
    collector: Collector,
    builder: MetricBuilder,
    sink: Arc<dyn MetricSink>,
}

impl Pipeline {
    pub fn new(collector: Collector, builder: MetricBuilder, sink: Arc<dyn MetricSink>) -> Self {
        Self {
            collector,
            builder,
            sink,
        }
    }

    /// Pipeline backed by the router's diagnostic commands.
    pub fn from_settings(settings: &AgentSettings, sink: Arc<dyn MetricSink>) -> Self {
        let sources = Arc::new(SystemSources::new(
            settings.commands.clone(),
            settings.command_timeout(),
        ));

        let mut collector = Collector::new(sources.clone(), sources.clone())
            .with_device_prefix(&settings.device_prefix);
        if settings.collect.traffic {
            collector = collector.with_traffic(sources.clone());
        }
        if settings.collect.device_labels {
            collector = collector.with_labels(sources);
        }

        Self::new(collector, MetricBuilder::new(&settings.metric_prefix), sink)
    }

    /// Build the metric points for one cycle without sending them.
    pub async fn collect_points(&self) -> (Vec<MetricPoint>, CycleReport) {
        let collection = self.collector.collect().await;
        let mut report = CycleReport {
            step_errors: collection.errors.len(),
            ..Default::default()
        };

        let records = merge(
            &collection.interfaces,
            &collection.statuses,
            collection.traffic.as_ref(),
        );
        report.records = records.len();

        let mut points = Vec::with_capacity(records.len() * 7);
        for record in &records {
            let label = match self.collector.resolve_label(record).await {
                Ok(label) => label,
                Err(e) => {
                    warn!(
                        interface = %record.interface_name,
                        device = %record.device_name,
                        error = %e,
                        "Skipping interface without device label"
                    );
                    report.skipped += 1;
                    continue;
                }
            };

            let timestamp = current_timestamp_millis();
            points.extend(self.builder.build(record, &label, timestamp));
        }
        report.points = points.len();

        (points, report)
    }

    /// Run one full cycle. Failures are logged and reported, never returned.
    pub async fn run_cycle(&self) -> CycleReport {
        let (points, mut report) = self.collect_points().await;

        if points.is_empty() {
            debug!(
                records = report.records,
                step_errors = report.step_errors,
                "No metrics this cycle"
            );
            return report;
        }

        match self.sink.write(&points).await {
            Ok(pushed) => {
                report.pushed = pushed;
                info!(
                    records = report.records,
                    skipped = report.skipped,
                    points = report.points,
                    "Pushed cycle metrics"
                );
            }
            Err(e) => {
                report.push_failed = true;
                warn!(points = report.points, error = %e, "Failed to push metrics");
            }
        }

        report
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("collector", &self.collector)
            .field("builder", &self.builder)
            .finish_non_exhaustive()
    }
}
