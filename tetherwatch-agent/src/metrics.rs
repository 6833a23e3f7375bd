//! Conversion of combined records into metric points.

use tetherwatch_common::MetricPoint;
use tetherwatch_exporter_remote_write::mapping::sanitize_metric_name;

use crate::duration::duration_seconds;
use crate::model::CombinedRecord;

/// Default metric name prefix.
pub const DEFAULT_METRIC_PREFIX: &str = "tether_iface";

/// Label carrying the device description.
pub const DEVICE_LABEL: &str = "device";

/// Label carrying the logical interface name.
pub const INTERFACE_LABEL: &str = "interface";

/// Builds the per-interface metric set.
#[derive(Debug, Clone)]
pub struct MetricBuilder {
    prefix: String,
}

impl Default for MetricBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_METRIC_PREFIX)
    }
}

impl MetricBuilder {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: sanitize_metric_name(prefix),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Full metric name for a suffix, e.g. `tether_iface_rx`.
    pub fn metric_name(&self, suffix: &str) -> String {
        format!("{}_{}", self.prefix, suffix)
    }

    /// Five points per record, plus `tx` and `rx` when traffic was collected.
    ///
    /// All points share `timestamp` and carry the `device` and `interface`
    /// labels.
    pub fn build(
        &self,
        record: &CombinedRecord,
        device_label: &str,
        timestamp: i64,
    ) -> Vec<MetricPoint> {
        let mut values = vec![
            ("up_time", duration_seconds(&record.total_uptime_text)),
            ("online_time", duration_seconds(&record.online_duration_text)),
            ("status_online", flag(record.is_online())),
            ("status_enabled", flag(record.is_enabled())),
            ("status_tracking", flag(record.is_tracking())),
        ];

        if let Some(traffic) = record.traffic {
            values.push(("tx", traffic.transmitted_bytes as f64));
            values.push(("rx", traffic.received_bytes as f64));
        }

        values
            .into_iter()
            .map(|(suffix, value)| {
                MetricPoint::new(self.metric_name(suffix), value, timestamp)
                    .with_label(DEVICE_LABEL, device_label)
                    .with_label(INTERFACE_LABEL, record.interface_name.as_str())
            })
            .collect()
    }
}

fn flag(set: bool) -> f64 {
    if set { 1.0 } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TrafficCounters;

    fn record(status: &str, tracking: &str, traffic: Option<TrafficCounters>) -> CombinedRecord {
        CombinedRecord {
            interface_name: "wan1".to_string(),
            device_name: "usb0".to_string(),
            status: status.to_string(),
            online_duration_text: "0h:10m:00s".to_string(),
            total_uptime_text: "1h:00m:00s".to_string(),
            tracking: tracking.to_string(),
            traffic,
        }
    }

    fn value(points: &[MetricPoint], name: &str) -> Option<f64> {
        points.iter().find(|p| p.name == name).map(|p| p.value)
    }

    #[test]
    fn test_online_active() {
        let points = MetricBuilder::default().build(&record("online", "active", None), "usb0", 42);

        assert_eq!(points.len(), 5);
        assert_eq!(value(&points, "tether_iface_up_time"), Some(3600.0));
        assert_eq!(value(&points, "tether_iface_online_time"), Some(600.0));
        assert_eq!(value(&points, "tether_iface_status_online"), Some(1.0));
        assert_eq!(value(&points, "tether_iface_status_enabled"), Some(1.0));
        assert_eq!(value(&points, "tether_iface_status_tracking"), Some(1.0));
    }

    #[test]
    fn test_disabled() {
        let points =
            MetricBuilder::default().build(&record("disabled", "active", None), "usb0", 42);

        assert_eq!(value(&points, "tether_iface_status_online"), Some(0.0));
        assert_eq!(value(&points, "tether_iface_status_enabled"), Some(0.0));
        assert_eq!(value(&points, "tether_iface_status_tracking"), Some(1.0));
    }

    #[test]
    fn test_offline_paused() {
        let points = MetricBuilder::default().build(&record("offline", "paused", None), "usb0", 1);

        assert_eq!(value(&points, "tether_iface_status_online"), Some(0.0));
        assert_eq!(value(&points, "tether_iface_status_enabled"), Some(1.0));
        assert_eq!(value(&points, "tether_iface_status_tracking"), Some(0.0));
    }

    #[test]
    fn test_traffic_points() {
        let traffic = Some(TrafficCounters::new(1_234_567, 765_432));
        let points = MetricBuilder::default().build(&record("online", "active", traffic), "usb0", 1);

        assert_eq!(points.len(), 7);
        assert_eq!(value(&points, "tether_iface_rx"), Some(1_234_567.0));
        assert_eq!(value(&points, "tether_iface_tx"), Some(765_432.0));
    }

    #[test]
    fn test_zero_traffic_still_emitted() {
        let traffic = Some(TrafficCounters::ZERO);
        let points = MetricBuilder::default().build(&record("online", "active", traffic), "usb0", 1);

        assert_eq!(points.len(), 7);
        assert_eq!(value(&points, "tether_iface_rx"), Some(0.0));
    }

    #[test]
    fn test_labels_and_timestamp() {
        let points =
            MetricBuilder::default().build(&record("online", "active", None), "Quectel EC25", 99);

        for point in &points {
            assert_eq!(point.timestamp, 99);
            assert_eq!(point.label(DEVICE_LABEL), Some("Quectel EC25"));
            assert_eq!(point.label(INTERFACE_LABEL), Some("wan1"));
            assert_eq!(point.labels.len(), 2);
        }
    }

    #[test]
    fn test_malformed_duration_is_zero() {
        let mut r = record("online", "active", None);
        r.total_uptime_text = "garbage".to_string();
        let points = MetricBuilder::default().build(&r, "usb0", 1);

        assert_eq!(value(&points, "tether_iface_up_time"), Some(0.0));
    }

    #[test]
    fn test_custom_prefix_is_sanitized() {
        let builder = MetricBuilder::new("lte-modem.iface");
        assert_eq!(builder.prefix(), "lte_modem_iface");
        assert_eq!(builder.metric_name("rx"), "lte_modem_iface_rx");
    }
}
