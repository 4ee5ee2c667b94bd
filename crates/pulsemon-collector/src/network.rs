use std::time::Instant;

use pulsemon_common::types::InterfaceTraffic;
use sysinfo::Networks;

use crate::rates::{round2, CounterRecord, CounterStore};

const MB: f64 = 1024.0 * 1024.0;

/// Totals plus instantaneous kbps rates for every interface present this
/// cycle. Rate baselines are keyed per interface, so a hotplugged interface
/// starts from zero without disturbing the others.
pub fn collect(
    networks: &Networks,
    counters: &mut CounterStore,
    now: Instant,
) -> Vec<InterfaceTraffic> {
    let mut out: Vec<InterfaceTraffic> = networks
        .iter()
        .map(|(name, data)| {
            let record = CounterRecord {
                bytes_in: data.total_received(),
                bytes_out: data.total_transmitted(),
                ops_in: data.total_packets_received(),
                ops_out: data.total_packets_transmitted(),
            };
            let rates = counters.compute_rate(&format!("net:{name}"), record, now);
            InterfaceTraffic {
                interface: name.clone(),
                bytes_sent_mb: round2(record.bytes_out as f64 / MB),
                bytes_recv_mb: round2(record.bytes_in as f64 / MB),
                packets_sent: record.ops_out,
                packets_recv: record.ops_in,
                errors_in: data.total_errors_on_received(),
                errors_out: data.total_errors_on_transmitted(),
                send_rate_kbps: round2(rates.bytes_out_per_sec * 8.0 / 1000.0),
                recv_rate_kbps: round2(rates.bytes_in_per_sec * 8.0 / 1000.0),
            }
        })
        .collect();
    out.sort_by(|a, b| a.interface.cmp(&b.interface));
    out
}
