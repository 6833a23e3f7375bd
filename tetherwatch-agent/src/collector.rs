//! One collection pass over all data sources.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use crate::model::{
    CombinedRecord, DEFAULT_TETHER_PREFIX, FailoverStatusRecord, InterfaceRecord, TrafficTable,
};
use crate::source::{InventorySource, LabelSource, SourceError, StatusSource, TrafficSource};

/// A stage of the collection pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Inventory,
    Status,
    Traffic,
    DeviceLabel,
}

impl Step {
    pub fn as_str(&self) -> &'static str {
        match self {
            Step::Inventory => "inventory",
            Step::Status => "status",
            Step::Traffic => "traffic",
            Step::DeviceLabel => "device_label",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A source failure tagged with the step it broke.
#[derive(Debug, Error)]
#[error("{step} step failed: {error}")]
pub struct StepError {
    pub step: Step,
    #[source]
    pub error: SourceError,
}

impl StepError {
    pub fn new(step: Step, error: SourceError) -> Self {
        Self { step, error }
    }
}

/// Raw results of one pass.
///
/// A failed step contributes nothing and records a [`StepError`]; the
/// other steps are unaffected.
#[derive(Debug, Default)]
pub struct Collection {
    /// Inventory, already restricted to tethered devices.
    pub interfaces: Vec<InterfaceRecord>,
    pub statuses: Vec<FailoverStatusRecord>,
    /// `None` if traffic collection is disabled or failed.
    pub traffic: Option<TrafficTable>,
    pub errors: Vec<StepError>,
}

/// Queries the sources for one cycle.
#[derive(Clone)]
pub struct Collector {
    inventory: Arc<dyn InventorySource>,
    status: Arc<dyn StatusSource>,
    traffic: Option<Arc<dyn TrafficSource>>,
    labels: Option<Arc<dyn LabelSource>>,
    device_prefix: String,
}

impl Collector {
    /// Collector with inventory and status only.
    ///
    /// Traffic is not collected and device names are used as labels until
    /// the corresponding sources are added.
    pub fn new(inventory: Arc<dyn InventorySource>, status: Arc<dyn StatusSource>) -> Self {
        Self {
            inventory,
            status,
            traffic: None,
            labels: None,
            device_prefix: DEFAULT_TETHER_PREFIX.to_string(),
        }
    }

    pub fn with_traffic(mut self, traffic: Arc<dyn TrafficSource>) -> Self {
        self.traffic = Some(traffic);
        self
    }

    pub fn with_labels(mut self, labels: Arc<dyn LabelSource>) -> Self {
        self.labels = Some(labels);
        self
    }

    /// Only devices whose name starts with `prefix` are kept (case-sensitive).
    pub fn with_device_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.device_prefix = prefix.into();
        self
    }

    /// Whether the record is backed by a tethered device.
    pub fn is_tethered(&self, record: &InterfaceRecord) -> bool {
        record.device_name.starts_with(&self.device_prefix)
    }

    /// Run every enabled step once.
    pub async fn collect(&self) -> Collection {
        let mut collection = Collection::default();

        match self.inventory.interfaces().await {
            Ok(interfaces) => {
                let total = interfaces.len();
                collection.interfaces = interfaces
                    .into_iter()
                    .filter(|r| self.is_tethered(r))
                    .collect();
                debug!(
                    total,
                    tethered = collection.interfaces.len(),
                    "Collected interface inventory"
                );
            }
            Err(e) => collection.errors.push(StepError::new(Step::Inventory, e)),
        }

        match self.status.statuses().await {
            Ok(statuses) => {
                debug!(count = statuses.len(), "Collected failover status");
                collection.statuses = statuses;
            }
            Err(e) => collection.errors.push(StepError::new(Step::Status, e)),
        }

        if let Some(ref traffic) = self.traffic {
            match traffic.counters().await {
                Ok(table) => {
                    debug!(devices = table.len(), "Collected traffic counters");
                    collection.traffic = Some(table);
                }
                Err(e) => collection.errors.push(StepError::new(Step::Traffic, e)),
            }
        }

        for error in &collection.errors {
            warn!(step = %error.step, error = %error.error, "Collection step failed");
        }

        collection
    }

    /// Label used for the `device` metric label.
    pub async fn resolve_label(&self, record: &CombinedRecord) -> Result<String, StepError> {
        match self.labels {
            Some(ref labels) => labels
                .device_label(&record.interface_name)
                .await
                .map_err(|e| StepError::new(Step::DeviceLabel, e)),
            None => Ok(record.device_name.clone()),
        }
    }
}

impl fmt::Debug for Collector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collector")
            .field("traffic", &self.traffic.is_some())
            .field("labels", &self.labels.is_some())
            .field("device_prefix", &self.device_prefix)
            .finish()
    }
}
