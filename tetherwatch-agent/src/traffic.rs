//! Parsing of `ifconfig`-style interface accounting output.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::{TrafficCounters, TrafficTable};

/// Matches `RX bytes:<n> ... TX bytes:<n>` on a single line.
static RX_TX_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"RX bytes:\s*(\d+).*?TX bytes:\s*(\d+)").unwrap());

/// Parse stanza output into counters keyed by device name.
///
/// Stanzas are separated by blank lines. The device name is the first
/// token of a stanza, with a trailing `:` removed. Stanzas without an
/// RX/TX byte line are left out.
pub fn parse_counters(raw: &str) -> TrafficTable {
    let mut table = TrafficTable::new();

    for block in blocks(raw) {
        let Some(device) = block
            .first()
            .and_then(|line| line.split_whitespace().next())
            .map(|token| token.strip_suffix(':').unwrap_or(token))
            .filter(|name| !name.is_empty())
        else {
            continue;
        };

        if let Some(counters) = block.iter().find_map(|line| parse_line(line)) {
            table.insert(device.to_string(), counters);
        }
    }

    table
}

/// Group lines into stanzas, dropping whitespace-only lines.
fn blocks(raw: &str) -> Vec<Vec<&str>> {
    let mut blocks = Vec::new();
    let mut current = Vec::new();

    for line in raw.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line);
        }
    }

    if !current.is_empty() {
        blocks.push(current);
    }

    blocks
}

fn parse_line(line: &str) -> Option<TrafficCounters> {
    let caps = RX_TX_REGEX.captures(line)?;
    // Digit runs too long for u64 degrade to zero.
    let rx = caps[1].parse().unwrap_or(0);
    let tx = caps[2].parse().unwrap_or(0);
    Some(TrafficCounters::new(rx, tx))
}
