use std::collections::BTreeMap;

use pulsemon_common::types::{SensorGroup, SensorReading};
use sysinfo::Components;

use crate::rates::round2;

/// Temperature readings grouped by chip, taking the first label token as
/// the chip name ("coretemp Core 0" -> "coretemp"). Components that report
/// no current temperature are dropped.
pub fn collect(components: &Components) -> Vec<SensorGroup> {
    let mut groups: BTreeMap<String, Vec<SensorReading>> = BTreeMap::new();
    for component in components {
        let Some(temperature) = component.temperature() else {
            continue;
        };
        let label = component.label().trim().to_string();
        let group = label
            .split_whitespace()
            .next()
            .unwrap_or("unknown")
            .to_string();
        groups.entry(group).or_default().push(SensorReading {
            label,
            temperature_c: round2(temperature as f64),
            max_c: component.max().map(|v| round2(v as f64)),
            critical_c: component.critical().map(|v| round2(v as f64)),
        });
    }
    groups
        .into_iter()
        .map(|(group, readings)| SensorGroup { group, readings })
        .collect()
}
