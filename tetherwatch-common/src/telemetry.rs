use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::Result;

/// A single named, labeled sample produced by the agent.
///
/// Labels are kept in a `BTreeMap` so every consumer sees them in the same
/// order, which the remote-write format requires anyway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricPoint {
    /// Metric name (e.g., "tether_iface_up_time").
    pub name: String,

    /// Label set (e.g., `device`, `interface`).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,

    /// Sample value.
    pub value: f64,

    /// Unix epoch milliseconds when the sample was taken.
    pub timestamp: i64,
}

impl MetricPoint {
    /// Create a new point with no labels.
    pub fn new(name: impl Into<String>, value: f64, timestamp: i64) -> Self {
        Self {
            name: name.into(),
            labels: BTreeMap::new(),
            value,
            timestamp,
        }
    }

    /// Add a label to this point.
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// Get a label value by key.
    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels.get(key).map(String::as_str)
    }

    /// Encode as a single line of JSON.
    pub fn to_json_line(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Get the current timestamp in milliseconds since Unix epoch.
pub fn current_timestamp_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
