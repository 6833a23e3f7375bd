//! Telemetry agent for USB-tethered WAN uplinks.
//!
//! Every push interval the agent reads the router's interface inventory,
//! failover status and traffic counters, keeps the interfaces backed by a
//! tethered modem, and pushes a small metric set per interface to a
//! Prometheus remote-write endpoint.
//!
//! # Metrics
//!
//! ```text
//! tether_iface_up_time{device, interface}          seconds
//! tether_iface_online_time{device, interface}      seconds
//! tether_iface_status_online{device, interface}    0/1
//! tether_iface_status_enabled{device, interface}   0/1
//! tether_iface_status_tracking{device, interface}  0/1
//! tether_iface_tx{device, interface}               bytes
//! tether_iface_rx{device, interface}               bytes
//! ```

pub mod collector;
pub mod config;
pub mod duration;
pub mod merge;
pub mod metrics;
pub mod model;
pub mod pipeline;
pub mod scheduler;
pub mod source;
pub mod traffic;

pub use collector::{Collection, Collector, Step, StepError};
pub use config::TetherAgentConfig;
pub use pipeline::{CycleReport, JsonLinesSink, MetricSink, Pipeline, SinkError};
pub use scheduler::Scheduler;
