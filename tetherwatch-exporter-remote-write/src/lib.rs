//! Prometheus remote-write pusher for tetherwatch metrics.
//!
//! This crate turns a batch of [`MetricPoint`](tetherwatch_common::MetricPoint)
//! values into a single remote-write request and sends it to a receiver
//! (Prometheus, Mimir, VictoriaMetrics, ...).
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌─────────────────┐     ┌─────────────────┐
//! │  MetricPoint[]  │────>│     mapping     │────>│     client      │
//! │  (one cycle)    │     │  (WriteRequest) │     │ (snappy + POST) │
//! └─────────────────┘     └─────────────────┘     └─────────────────┘
//! ```
//!
//! # Configuration
//!
//! See [`config::RemoteWriteConfig`] for configuration options.

pub mod client;
pub mod config;
pub mod mapping;
pub mod proto;

pub use client::{PushError, PushSummary, RemoteWriteClient};
pub use config::{ConfigError, RemoteWriteConfig};
