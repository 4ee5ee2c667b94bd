use pulsemon_common::types::RamStats;
use sysinfo::System;

use crate::rates::round2;

const GB: f64 = 1024.0 * 1024.0 * 1024.0;

pub fn collect(sys: &System) -> RamStats {
    let total = sys.total_memory() as f64;
    let available = sys.available_memory() as f64;
    // Utilization counts memory the kernel could not hand out, not the
    // "used" figure that excludes reclaimable caches.
    let percent = if total > 0.0 {
        (total - available) / total * 100.0
    } else {
        0.0
    };
    RamStats {
        total_gb: round2(total / GB),
        available_gb: round2(available / GB),
        used_gb: round2(sys.used_memory() as f64 / GB),
        percent: round2(percent),
        swap_total_gb: round2(sys.total_swap() as f64 / GB),
        swap_used_gb: round2(sys.used_swap() as f64 / GB),
    }
}
