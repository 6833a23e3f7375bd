//! Parsing of failover session durations such as `"2h:03m:04s"`.

use thiserror::Error;
use tracing::debug;

/// Unit suffix accepted on each segment, in order.
const UNITS: [(&str, f64); 3] = [("h", 3600.0), ("m", 60.0), ("s", 1.0)];

/// Reasons a duration string could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DurationError {
    #[error("empty duration")]
    Empty,

    #[error("expected 3 colon-separated segments, got {0}")]
    SegmentCount(usize),

    #[error("invalid {segment} segment '{value}'")]
    InvalidSegment { segment: &'static str, value: String },
}

/// Parse `"<h>h:<m>m:<s>s"` (or `"<h>:<m>:<s>"`) into seconds.
///
/// Each segment is an unsigned integer or decimal, optionally followed by
/// its own unit letter.
pub fn parse_duration(text: &str) -> Result<f64, DurationError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(DurationError::Empty);
    }

    let segments: Vec<&str> = text.split(':').collect();
    if segments.len() != UNITS.len() {
        return Err(DurationError::SegmentCount(segments.len()));
    }

    let mut total = 0.0;
    for (raw, (unit, scale)) in segments.iter().zip(UNITS) {
        let value = parse_segment(raw, unit).ok_or_else(|| DurationError::InvalidSegment {
            segment: unit,
            value: raw.trim().to_string(),
        })?;
        total += value * scale;
    }

    Ok(total)
}

/// Parse a duration, treating anything malformed as zero seconds.
pub fn duration_seconds(text: &str) -> f64 {
    match parse_duration(text) {
        Ok(seconds) => seconds,
        Err(e) => {
            debug!(text, error = %e, "Unparseable duration, using 0");
            0.0
        }
    }
}

fn parse_segment(raw: &str, unit: &str) -> Option<f64> {
    let raw = raw.trim();
    let number = raw.strip_suffix(unit).unwrap_or(raw).trim_end();

    // Digits with at most one dot; rules out signs, exponents, "inf" and "nan".
    let dots = number.chars().filter(|c| *c == '.').count();
    let digits = number.chars().filter(char::is_ascii_digit).count();
    if digits == 0 || dots > 1 || digits + dots != number.len() {
        return None;
    }

    number.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suffixed_form() {
        assert_eq!(parse_duration("2h:03m:04s"), Ok(7384.0));
        assert_eq!(parse_duration("0h:10m:00s"), Ok(600.0));
        assert_eq!(parse_duration("1h:00m:00s"), Ok(3600.0));
    }

    #[test]
    fn test_plain_form() {
        assert_eq!(parse_duration("2:03:04"), Ok(7384.0));
        // suffixes may be mixed per segment
        assert_eq!(parse_duration("2h:03:04s"), Ok(7384.0));
    }

    #[test]
    fn test_whitespace_and_decimals() {
        assert_eq!(parse_duration("  0h:01m:30.5s \n"), Ok(90.5));
        assert_eq!(parse_duration("0.5h:0m:0s"), Ok(1800.0));
        assert_eq!(parse_duration("0h: 1m :2s"), Ok(62.0));
    }

    #[test]
    fn test_large_hours() {
        assert_eq!(parse_duration("100h:00m:00s"), Ok(360_000.0));
    }

    #[test]
    fn test_empty() {
        assert_eq!(parse_duration(""), Err(DurationError::Empty));
        assert_eq!(parse_duration("   "), Err(DurationError::Empty));
    }

    #[test]
    fn test_wrong_segment_count() {
        assert_eq!(parse_duration("garbage"), Err(DurationError::SegmentCount(1)));
        assert_eq!(parse_duration("10m:00s"), Err(DurationError::SegmentCount(2)));
        assert_eq!(parse_duration("1:2:3:4"), Err(DurationError::SegmentCount(4)));
    }

    #[test]
    fn test_invalid_segments() {
        assert_eq!(
            parse_duration("xh:00m:00s"),
            Err(DurationError::InvalidSegment {
                segment: "h",
                value: "xh".to_string()
            })
        );
        assert!(parse_duration("-1h:00m:00s").is_err());
        assert!(parse_duration("0h:infm:00s").is_err());
        assert!(parse_duration("0h:00m:NaNs").is_err());
        assert!(parse_duration("0h:00m:1e3s").is_err());
        assert!(parse_duration("0h:00m:1.2.3s").is_err());
        // a unit letter belongs to its own segment only
        assert!(parse_duration("0m:00h:00s").is_err());
        assert!(parse_duration("h:m:s").is_err());
    }

    #[test]
    fn test_duration_seconds_degrades_to_zero() {
        assert_eq!(duration_seconds("2h:03m:04s"), 7384.0);
        assert_eq!(duration_seconds(""), 0.0);
        assert_eq!(duration_seconds("garbage"), 0.0);
        assert_eq!(duration_seconds("-5h:00m:00s"), 0.0);
    }

    #[test]
    fn test_never_negative() {
        for input in ["", "1:2:3", "-1:-2:-3", "::", "0h:0m:-0s", "99h:59m:59s"] {
            assert!(duration_seconds(input) >= 0.0, "{input}");
        }
    }
}
