//! Canned sources and a recording sink for pipeline tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use tetherwatch_agent::collector::Collector;
use tetherwatch_agent::metrics::MetricBuilder;
use tetherwatch_agent::model::{FailoverStatusRecord, InterfaceRecord, TrafficTable};
use tetherwatch_agent::pipeline::{MetricSink, Pipeline, SinkError};
use tetherwatch_agent::source::{
    InventorySource, LabelSource, SourceError, StatusSource, TrafficSource,
};
use tetherwatch_common::MetricPoint;
use tetherwatch_exporter_remote_write::PushError;

pub fn failure(program: &str) -> SourceError {
    SourceError::ExitStatus {
        program: program.to_string(),
        code: Some(1),
        stderr: "not available".to_string(),
    }
}

/// Sources returning whatever the test put in them.
#[derive(Default)]
pub struct FakeSources {
    pub interfaces: Mutex<Vec<InterfaceRecord>>,
    pub statuses: Mutex<Vec<FailoverStatusRecord>>,
    pub traffic: Mutex<TrafficTable>,
    pub labels: Mutex<HashMap<String, String>>,
    pub fail_inventory: AtomicBool,
    pub fail_status: AtomicBool,
    pub fail_traffic: AtomicBool,
    /// Status queries never complete.
    pub hang_status: AtomicBool,
    pub status_calls: AtomicUsize,
}

impl FakeSources {
    /// One online tethered interface, `wan1` on `usb0`.
    pub fn single_uplink() -> Arc<Self> {
        let sources = Self::default();
        *sources.interfaces.lock().unwrap() = vec![InterfaceRecord::new("wan1", "usb0")];
        *sources.statuses.lock().unwrap() = vec![status("wan1", "online", "active")];
        Arc::new(sources)
    }
}

pub fn status(interface: &str, status: &str, tracking: &str) -> FailoverStatusRecord {
    FailoverStatusRecord {
        interface_name: interface.to_string(),
        status: status.to_string(),
        online_duration_text: "0h:10m:00s".to_string(),
        total_uptime_text: "1h:00m:00s".to_string(),
        tracking: tracking.to_string(),
    }
}

#[async_trait]
impl InventorySource for FakeSources {
    async fn interfaces(&self) -> Result<Vec<InterfaceRecord>, SourceError> {
        if self.fail_inventory.load(Ordering::SeqCst) {
            return Err(failure("ifdev"));
        }
        Ok(self.interfaces.lock().unwrap().clone())
    }
}

#[async_trait]
impl StatusSource for FakeSources {
    async fn statuses(&self) -> Result<Vec<FailoverStatusRecord>, SourceError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        if self.hang_status.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.fail_status.load(Ordering::SeqCst) {
            return Err(failure("mwan3ifstatus"));
        }
        Ok(self.statuses.lock().unwrap().clone())
    }
}

#[async_trait]
impl TrafficSource for FakeSources {
    async fn counters(&self) -> Result<TrafficTable, SourceError> {
        if self.fail_traffic.load(Ordering::SeqCst) {
            return Err(failure("ifconfig"));
        }
        Ok(self.traffic.lock().unwrap().clone())
    }
}

#[async_trait]
impl LabelSource for FakeSources {
    async fn device_label(&self, interface_name: &str) -> Result<String, SourceError> {
        self.labels
            .lock()
            .unwrap()
            .get(interface_name)
            .cloned()
            .ok_or_else(|| SourceError::EmptyLabel {
                interface: interface_name.to_string(),
            })
    }
}

/// Sink keeping every batch it receives.
#[derive(Default)]
pub struct RecordingSink {
    pub batches: Mutex<Vec<Vec<MetricPoint>>>,
    pub fail: AtomicBool,
}

impl RecordingSink {
    pub fn batches(&self) -> Vec<Vec<MetricPoint>> {
        self.batches.lock().unwrap().clone()
    }
}

#[async_trait]
impl MetricSink for RecordingSink {
    async fn write(&self, points: &[MetricPoint]) -> Result<usize, SinkError> {
        self.batches.lock().unwrap().push(points.to_vec());
        if self.fail.load(Ordering::SeqCst) {
            return Err(PushError::Status {
                status: 503,
                body: "unavailable".to_string(),
            }
            .into());
        }
        Ok(points.len())
    }
}

/// Pipeline with inventory and status only.
pub fn basic_pipeline(sources: &Arc<FakeSources>, sink: &Arc<RecordingSink>) -> Pipeline {
    let collector = Collector::new(sources.clone(), sources.clone());
    Pipeline::new(collector, MetricBuilder::default(), sink.clone())
}

/// Value of the first point named `name`.
pub fn value(points: &[MetricPoint], name: &str) -> Option<f64> {
    points.iter().find(|p| p.name == name).map(|p| p.value)
}
