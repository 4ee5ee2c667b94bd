use serde::Serialize;
use std::collections::BTreeMap;

/// Event name carried in every push frame.
pub const UPDATE_STATS_EVENT: &str = "update_stats";

/// Result of sampling one metric category.
///
/// Serializes to the category payload itself on success, or to
/// `{"error": "..."}` when the source failed. Consumers can rely on every
/// category key being present in a [`Snapshot`] either way.
///
/// # Examples
///
/// ```
/// use pulsemon_common::Sample;
///
/// let ok: Sample<u32> = Sample::Ok(7);
/// assert_eq!(serde_json::to_string(&ok).unwrap(), "7");
///
/// let err: Sample<u32> = Sample::err("sensor unavailable");
/// assert_eq!(
///     serde_json::to_string(&err).unwrap(),
///     r#"{"error":"sensor unavailable"}"#
/// );
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Sample<T> {
    Ok(T),
    Err { error: String },
}

impl<T> Sample<T> {
    pub fn err(message: impl Into<String>) -> Self {
        Sample::Err {
            error: message.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Sample::Ok(_))
    }

    pub fn as_ok(&self) -> Option<&T> {
        match self {
            Sample::Ok(v) => Some(v),
            Sample::Err { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CpuStats {
    /// Overall utilization percent across all cores.
    pub overall_percent: f64,
    /// Per-core utilization percent, in core order.
    pub per_core_percent: Vec<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RamStats {
    pub total_gb: f64,
    pub available_gb: f64,
    pub used_gb: f64,
    pub percent: f64,
    pub swap_total_gb: f64,
    pub swap_used_gb: f64,
}

/// One configured storage path. A path that cannot be resolved yields the
/// `Error` form in place of its usage entry, leaving the other paths intact.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum StorageEntry {
    Usage {
        path: String,
        total_gb: f64,
        used_gb: f64,
        free_gb: f64,
        percent: f64,
    },
    Error {
        path: String,
        error: String,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct InterfaceTraffic {
    pub interface: String,
    pub bytes_sent_mb: f64,
    pub bytes_recv_mb: f64,
    pub packets_sent: u64,
    pub packets_recv: u64,
    pub errors_in: u64,
    pub errors_out: u64,
    /// Instantaneous send rate in kilobits per second.
    pub send_rate_kbps: f64,
    /// Instantaneous receive rate in kilobits per second.
    pub recv_rate_kbps: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoadAverage {
    pub one_min: f64,
    pub five_min: f64,
    pub fifteen_min: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcessEntry {
    pub pid: u32,
    pub name: String,
    pub cpu_percent: f64,
    pub memory_mb: f64,
}

/// Top process tables, one ranked by CPU and one by resident memory.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessTop {
    pub by_cpu: Vec<ProcessEntry>,
    pub by_memory: Vec<ProcessEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SensorReading {
    pub label: String,
    pub temperature_c: f64,
    pub max_c: Option<f64>,
    pub critical_c: Option<f64>,
}

/// Temperature readings grouped by sensor chip.
#[derive(Debug, Clone, Serialize)]
pub struct SensorGroup {
    pub group: String,
    pub readings: Vec<SensorReading>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NvidiaGpu {
    pub name: String,
    pub utilization_percent: f64,
    pub memory_used_mb: f64,
    pub memory_total_mb: f64,
    pub temperature_c: f64,
}

/// AMD GPU sample assembled from radeontop output.
///
/// `status` is `"ok"` when at least one metric was parsed; otherwise it
/// explains why the table is empty. `metrics` keys are normalized to
/// percent / mb / mhz units (`gpu_load_percent`, `vram_used_mb`, ...).
#[derive(Debug, Clone, Serialize)]
pub struct AmdGpuStats {
    pub status: String,
    pub device: String,
    pub metrics: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContainerInfo {
    pub id: String,
    pub name: String,
    pub image: String,
    pub state: String,
    pub status: String,
}

/// Container listing. `status` is `"ok"` or a reason the runtime could not
/// be queried; the list is empty in the latter case.
#[derive(Debug, Clone, Serialize)]
pub struct ContainerList {
    pub status: String,
    pub containers: Vec<ContainerInfo>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DiskThroughput {
    pub device: String,
    pub read_total_mb: f64,
    pub write_total_mb: f64,
    pub read_rate_mbps: f64,
    pub write_rate_mbps: f64,
    pub read_iops: f64,
    pub write_iops: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LogTail {
    pub name: String,
    pub path: String,
    pub lines: Vec<String>,
}

/// One complete sampling cycle. Every category is always present; sources
/// that failed carry their error inline instead of dropping the key.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    /// Wall-clock sample time, UTC, `YYYY-MM-DD HH:MM:SS`.
    pub timestamp: String,
    pub cpu: Sample<CpuStats>,
    pub ram: Sample<RamStats>,
    pub storage: Sample<Vec<StorageEntry>>,
    pub network: Sample<Vec<InterfaceTraffic>>,
    pub uptime: Sample<String>,
    pub load_average: Sample<LoadAverage>,
    pub processes: Sample<ProcessTop>,
    pub sensors: Sample<Vec<SensorGroup>>,
    pub gpu_nvidia: Sample<Vec<NvidiaGpu>>,
    pub gpu_amd: Sample<AmdGpuStats>,
    pub containers: Sample<ContainerList>,
    pub disk_io: Sample<Vec<DiskThroughput>>,
    pub logs: Sample<Vec<LogTail>>,
}

impl Snapshot {
    /// Wraps the snapshot in the push-frame envelope without cloning it.
    pub fn as_event(&self) -> PushEvent<'_> {
        PushEvent {
            event: UPDATE_STATS_EVENT,
            data: self,
        }
    }
}

/// Frame pushed to every connected viewer: `{"event": "update_stats", "data": {...}}`.
#[derive(Debug, Serialize)]
pub struct PushEvent<'a> {
    pub event: &'static str,
    pub data: &'a Snapshot,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_serializes_payload_or_error() {
        let ok: Sample<Vec<u32>> = Sample::Ok(vec![1, 2]);
        assert_eq!(serde_json::to_string(&ok).unwrap(), "[1,2]");

        let err: Sample<Vec<u32>> = Sample::err("boom");
        assert_eq!(serde_json::to_string(&err).unwrap(), r#"{"error":"boom"}"#);
    }

    #[test]
    fn storage_entry_error_form_keeps_path() {
        let entry = StorageEntry::Error {
            path: "/mnt/missing".into(),
            error: "Path not found or not accessible".into(),
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["path"], "/mnt/missing");
        assert_eq!(json["error"], "Path not found or not accessible");
        assert!(json.get("total_gb").is_none());
    }

    #[test]
    fn event_envelope_has_fixed_name() {
        let snapshot = Snapshot {
            timestamp: "2025-01-01 00:00:00".into(),
            cpu: Sample::err("n/a"),
            ram: Sample::err("n/a"),
            storage: Sample::Ok(vec![]),
            network: Sample::Ok(vec![]),
            uptime: Sample::Ok("0:00:01".into()),
            load_average: Sample::err("n/a"),
            processes: Sample::err("n/a"),
            sensors: Sample::Ok(vec![]),
            gpu_nvidia: Sample::Ok(vec![]),
            gpu_amd: Sample::err("n/a"),
            containers: Sample::err("n/a"),
            disk_io: Sample::Ok(vec![]),
            logs: Sample::Ok(vec![]),
        };
        let json = serde_json::to_value(snapshot.as_event()).unwrap();
        assert_eq!(json["event"], UPDATE_STATS_EVENT);
        assert_eq!(json["data"]["timestamp"], "2025-01-01 00:00:00");
        assert_eq!(json["data"]["uptime"], "0:00:01");
        assert_eq!(json["data"]["cpu"]["error"], "n/a");
    }
}
