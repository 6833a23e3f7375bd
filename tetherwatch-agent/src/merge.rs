//! Joining inventory, status and traffic into one record per interface.

use std::collections::HashMap;

use crate::model::{
    CombinedRecord, FailoverStatusRecord, InterfaceRecord, TrafficCounters, TrafficTable,
};

/// Join the three sources for one cycle.
///
/// Interfaces are matched by name, then traffic by the inventory's device
/// name. Only interfaces present in both `statuses` and `interfaces`
/// produce a record; a device with no traffic entry gets zero counters.
/// Output follows the order of `statuses`.
pub fn merge(
    interfaces: &[InterfaceRecord],
    statuses: &[FailoverStatusRecord],
    traffic: Option<&TrafficTable>,
) -> Vec<CombinedRecord> {
    // Later duplicates overwrite earlier ones.
    let by_name: HashMap<&str, &InterfaceRecord> = interfaces
        .iter()
        .map(|r| (r.interface_name.as_str(), r))
        .collect();

    statuses
        .iter()
        .filter_map(|status| {
            let inventory = by_name.get(status.interface_name.as_str())?;
            let counters = traffic.map(|table| {
                table
                    .get(&inventory.device_name)
                    .copied()
                    .unwrap_or(TrafficCounters::ZERO)
            });

            Some(CombinedRecord {
                interface_name: status.interface_name.clone(),
                device_name: inventory.device_name.clone(),
                status: status.status.clone(),
                online_duration_text: status.online_duration_text.clone(),
                total_uptime_text: status.total_uptime_text.clone(),
                tracking: status.tracking.clone(),
                traffic: counters,
            })
        })
        .collect()
}
