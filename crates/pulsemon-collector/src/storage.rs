use std::path::{Path, PathBuf};

use pulsemon_common::types::StorageEntry;
use sysinfo::Disks;

use crate::rates::round2;

const GB: f64 = 1024.0 * 1024.0 * 1024.0;

#[derive(Debug, Clone)]
pub(crate) struct MountUsage {
    pub(crate) mount: PathBuf,
    pub(crate) total: u64,
    pub(crate) available: u64,
}

/// Usage for each configured path. A path that does not resolve yields a
/// per-path error entry; the remaining paths are reported normally.
pub fn collect(disks: &Disks, paths: &[String]) -> Vec<StorageEntry> {
    let mounts: Vec<MountUsage> = disks
        .iter()
        .map(|disk| MountUsage {
            mount: disk.mount_point().to_path_buf(),
            total: disk.total_space(),
            available: disk.available_space(),
        })
        .collect();
    paths
        .iter()
        .map(|path| entry_for_path(&mounts, path))
        .collect()
}

pub(crate) fn entry_for_path(mounts: &[MountUsage], path: &str) -> StorageEntry {
    if !Path::new(path).exists() {
        return error_entry(path, "Path not found or not accessible");
    }
    let resolved = match std::fs::canonicalize(path) {
        Ok(p) => p,
        Err(e) => return error_entry(path, format!("Error accessing path: {e}")),
    };
    // Longest mount-point prefix wins, so /data beats / for /data/logs.
    let containing = mounts
        .iter()
        .filter(|m| resolved.starts_with(&m.mount))
        .max_by_key(|m| m.mount.as_os_str().len());
    let Some(mount) = containing else {
        return error_entry(path, "No containing filesystem found");
    };
    let used = mount.total.saturating_sub(mount.available);
    let percent = if mount.total > 0 {
        used as f64 / mount.total as f64 * 100.0
    } else {
        0.0
    };
    StorageEntry::Usage {
        path: path.to_string(),
        total_gb: round2(mount.total as f64 / GB),
        used_gb: round2(used as f64 / GB),
        free_gb: round2(mount.available as f64 / GB),
        percent: round2(percent),
    }
}

fn error_entry(path: &str, error: impl Into<String>) -> StorageEntry {
    StorageEntry::Error {
        path: path.to_string(),
        error: error.into(),
    }
}
