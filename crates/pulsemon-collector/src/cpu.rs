use pulsemon_common::types::CpuStats;
use sysinfo::System;

use crate::rates::round2;

/// Overall and per-core utilization. sysinfo needs two refreshes separated
/// by a real interval before the percentages mean anything; the orchestrator
/// refreshes once per cycle, so the first snapshot reads near zero and the
/// numbers settle from the second cycle on.
pub fn collect(sys: &System) -> CpuStats {
    CpuStats {
        overall_percent: round2(sys.global_cpu_usage() as f64),
        per_core_percent: sys
            .cpus()
            .iter()
            .map(|cpu| round2(cpu.cpu_usage() as f64))
            .collect(),
    }
}
