use std::time::Instant;

use pulsemon_common::types::DiskThroughput;

use crate::error::{CollectError, Result};
use crate::rates::{round2, CounterRecord, CounterStore};

const DISKSTATS: &str = "/proc/diskstats";
/// `/proc/diskstats` sector counts are fixed 512-byte units regardless of
/// the hardware sector size.
const SECTOR_SIZE: u64 = 512;
const MB: f64 = 1024.0 * 1024.0;

/// Per-device throughput and IOPS from the kernel's block-layer counters.
/// On systems without procfs this fails into the category's error slot and
/// everything else proceeds.
pub fn collect(counters: &mut CounterStore, now: Instant) -> Result<Vec<DiskThroughput>> {
    let raw = std::fs::read_to_string(DISKSTATS).map_err(|source| CollectError::Io {
        path: DISKSTATS.to_string(),
        source,
    })?;
    Ok(throughput_from_stats(&raw, counters, now))
}

/// Field layout per row: major minor device reads reads_merged sectors_read
/// ms_reading writes writes_merged sectors_written ... Pseudo devices
/// (loop, ram) are skipped.
pub(crate) fn throughput_from_stats(
    raw: &str,
    counters: &mut CounterStore,
    now: Instant,
) -> Vec<DiskThroughput> {
    let mut out = Vec::new();
    for line in raw.lines() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 10 {
            continue;
        }
        let device = fields[2];
        if device.starts_with("loop") || device.starts_with("ram") {
            continue;
        }
        let parsed = (
            fields[3].parse::<u64>(),
            fields[5].parse::<u64>(),
            fields[7].parse::<u64>(),
            fields[9].parse::<u64>(),
        );
        let (Ok(reads), Ok(sectors_read), Ok(writes), Ok(sectors_written)) = parsed else {
            continue;
        };
        let record = CounterRecord {
            bytes_in: sectors_read * SECTOR_SIZE,
            bytes_out: sectors_written * SECTOR_SIZE,
            ops_in: reads,
            ops_out: writes,
        };
        let rates = counters.compute_rate(&format!("disk:{device}"), record, now);
        out.push(DiskThroughput {
            device: device.to_string(),
            read_total_mb: round2(record.bytes_in as f64 / MB),
            write_total_mb: round2(record.bytes_out as f64 / MB),
            read_rate_mbps: round2(rates.bytes_in_per_sec / MB),
            write_rate_mbps: round2(rates.bytes_out_per_sec / MB),
            read_iops: round2(rates.ops_in_per_sec),
            write_iops: round2(rates.ops_out_per_sec),
        });
    }
    out
}
