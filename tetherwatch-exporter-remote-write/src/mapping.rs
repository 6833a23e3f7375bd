//! Mapping from tetherwatch `MetricPoint` to remote-write series.

use std::collections::BTreeMap;

use tetherwatch_common::MetricPoint;

use crate::proto::{Label, Sample, TimeSeries, WriteRequest};

/// Reserved label carrying the metric name.
pub const METRIC_NAME_LABEL: &str = "__name__";

/// Sanitize a metric name to be Prometheus-compatible.
///
/// Prometheus metric names must match `[a-zA-Z_:][a-zA-Z0-9_:]*`.
/// This function:
/// - Replaces invalid characters with underscores
/// - Ensures the name starts with a letter or underscore
/// - Collapses multiple underscores into one
pub fn sanitize_metric_name(name: &str) -> String {
    let mut result = String::with_capacity(name.len() + 1);
    let mut last_was_underscore = false;
    let mut chars = name.chars().peekable();

    // A leading digit is kept but prefixed with an underscore
    if let Some(&first) = chars.peek()
        && first.is_ascii_digit()
    {
        result.push('_');
        last_was_underscore = true;
    }

    for c in chars {
        let is_valid_char = c.is_ascii_alphanumeric() || c == '_' || c == ':';

        if is_valid_char {
            if c == '_' {
                if !last_was_underscore {
                    result.push(c);
                    last_was_underscore = true;
                }
            } else {
                result.push(c);
                last_was_underscore = false;
            }
        } else if !last_was_underscore {
            result.push('_');
            last_was_underscore = true;
        }
    }

    while result.ends_with('_') {
        result.pop();
    }

    if result.is_empty() {
        result.push_str("unnamed");
    }

    result
}

/// Sanitize a label name to be Prometheus-compatible.
///
/// Prometheus label names must match `[a-zA-Z_][a-zA-Z0-9_]*`.
/// Labels starting with `__` are reserved for internal use.
pub fn sanitize_label_name(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    let mut last_was_underscore = false;

    for (i, c) in name.chars().enumerate() {
        let valid = if i == 0 {
            c.is_ascii_alphabetic() || c == '_'
        } else {
            c.is_ascii_alphanumeric() || c == '_'
        };

        if valid {
            result.push(c);
            last_was_underscore = c == '_';
        } else if !last_was_underscore {
            result.push('_');
            last_was_underscore = true;
        }
    }

    while result.ends_with('_') {
        result.pop();
    }

    if result.is_empty() {
        return "label".to_string();
    }

    if result.starts_with("__") {
        result.insert(0, 'z');
    }

    result
}

/// Build the sorted label set for a point.
///
/// Order of precedence: `__name__`, then the point's own labels, then
/// external labels that do not collide with either.
pub fn build_labels(point: &MetricPoint, external: &BTreeMap<String, String>) -> Vec<Label> {
    let mut labels: BTreeMap<String, String> = BTreeMap::new();
    labels.insert(
        METRIC_NAME_LABEL.to_string(),
        sanitize_metric_name(&point.name),
    );

    for (k, v) in &point.labels {
        labels
            .entry(sanitize_label_name(k))
            .or_insert_with(|| v.clone());
    }

    for (k, v) in external {
        labels
            .entry(sanitize_label_name(k))
            .or_insert_with(|| v.clone());
    }

    labels
        .into_iter()
        .map(|(name, value)| Label { name, value })
        .collect()
}

/// Convert one point into a single-sample series.
pub fn to_time_series(point: &MetricPoint, external: &BTreeMap<String, String>) -> TimeSeries {
    TimeSeries {
        labels: build_labels(point, external),
        samples: vec![Sample {
            value: point.value,
            timestamp: point.timestamp,
        }],
    }
}

/// Build one write request holding every point of a cycle.
pub fn build_write_request(
    points: &[MetricPoint],
    external: &BTreeMap<String, String>,
) -> WriteRequest {
    WriteRequest {
        timeseries: points
            .iter()
            .map(|p| to_time_series(p, external))
            .collect(),
    }
}
