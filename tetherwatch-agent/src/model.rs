//! Records exchanged between the pipeline stages.
//!
//! Everything here is rebuilt from scratch every cycle.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer};

/// Device-name prefix of USB-tethered modems.
pub const DEFAULT_TETHER_PREFIX: &str = "usb";

/// One entry of the interface inventory (`ifdev`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct InterfaceRecord {
    /// Logical interface name (e.g., "wan1").
    #[serde(rename = "interface", deserialize_with = "nullable_string")]
    pub interface_name: String,

    /// Kernel device backing the interface (e.g., "usb0").
    #[serde(rename = "device", deserialize_with = "nullable_string")]
    pub device_name: String,
}

impl InterfaceRecord {
    pub fn new(interface_name: impl Into<String>, device_name: impl Into<String>) -> Self {
        Self {
            interface_name: interface_name.into(),
            device_name: device_name.into(),
        }
    }
}

/// One entry of the failover status report (`mwan3ifstatus`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FailoverStatusRecord {
    #[serde(rename = "interface", deserialize_with = "nullable_string")]
    pub interface_name: String,

    /// "online", "offline", "disabled", ...
    #[serde(deserialize_with = "nullable_string")]
    pub status: String,

    /// Time online in the current state, `"<h>h:<m>m:<s>s"`.
    #[serde(rename = "online_time", deserialize_with = "nullable_string")]
    pub online_duration_text: String,

    /// Total uptime of the interface, same layout.
    #[serde(rename = "uptime", deserialize_with = "nullable_string")]
    pub total_uptime_text: String,

    /// "active", "paused", "disabled", ...
    #[serde(deserialize_with = "nullable_string")]
    pub tracking: String,
}

/// Byte counters for one device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrafficCounters {
    pub received_bytes: u64,
    pub transmitted_bytes: u64,
}

impl TrafficCounters {
    pub const ZERO: TrafficCounters = TrafficCounters {
        received_bytes: 0,
        transmitted_bytes: 0,
    };

    pub fn new(received_bytes: u64, transmitted_bytes: u64) -> Self {
        Self {
            received_bytes,
            transmitted_bytes,
        }
    }
}

/// Traffic counters keyed by device name.
pub type TrafficTable = HashMap<String, TrafficCounters>;

/// Inventory, status and traffic joined for one interface.
#[derive(Debug, Clone, PartialEq)]
pub struct CombinedRecord {
    pub interface_name: String,
    pub device_name: String,
    pub status: String,
    pub online_duration_text: String,
    pub total_uptime_text: String,
    pub tracking: String,
    /// `None` when traffic was not collected this cycle; zero counters when
    /// it was collected but the device had no entry.
    pub traffic: Option<TrafficCounters>,
}

impl CombinedRecord {
    /// Failover reports the interface as online.
    pub fn is_online(&self) -> bool {
        self.status == "online"
    }

    /// Anything except an explicit "disabled" counts as enabled.
    pub fn is_enabled(&self) -> bool {
        self.status != "disabled"
    }

    /// Connectivity tracking is running.
    pub fn is_tracking(&self) -> bool {
        self.tracking == "active"
    }
}

/// Decode `null` as an empty string.
fn nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
