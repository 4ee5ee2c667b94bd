use pulsemon_common::types::{ProcessEntry, ProcessTop};
use sysinfo::System;

use crate::rates::round2;

const MB: f64 = 1024.0 * 1024.0;
const TOP_N: usize = 5;

/// Top processes by CPU and by resident memory. CPU percent is per-core
/// scaled, so a busy multi-threaded process can exceed 100.
pub fn collect(sys: &System) -> ProcessTop {
    let mut entries: Vec<ProcessEntry> = sys
        .processes()
        .iter()
        .map(|(pid, process)| ProcessEntry {
            pid: pid.as_u32(),
            name: process.name().to_string_lossy().into_owned(),
            cpu_percent: round2(process.cpu_usage() as f64),
            memory_mb: round2(process.memory() as f64 / MB),
        })
        .collect();

    let mut by_cpu = entries.clone();
    by_cpu.sort_by(|a, b| b.cpu_percent.total_cmp(&a.cpu_percent));
    by_cpu.truncate(TOP_N);

    entries.sort_by(|a, b| b.memory_mb.total_cmp(&a.memory_mb));
    entries.truncate(TOP_N);

    ProcessTop {
        by_cpu,
        by_memory: entries,
    }
}
