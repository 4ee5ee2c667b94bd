use std::time::Instant;

use chrono::Utc;
use pulsemon_common::types::Snapshot;
use pulsemon_common::Sample;
use sysinfo::{Components, Disks, Networks, ProcessesToUpdate, System};

use crate::logs::LogSource;
use crate::rates::CounterStore;
use crate::{cpu, diskio, docker, load, logs, memory, network, nvidia, processes, radeontop, sensors, storage};

/// Runtime inputs for a collection cycle, already validated by the caller.
#[derive(Debug, Clone, Default)]
pub struct CollectorConfig {
    /// Filesystem roots to report usage for.
    pub storage_paths: Vec<String>,
    /// Log files to tail.
    pub log_files: Vec<LogSource>,
}

/// Owns every OS handle plus the rate baselines across cycles. One instance
/// per process; callers serialize access, which keeps the counter store
/// single-writer.
pub struct StatsCollector {
    system: System,
    networks: Networks,
    disks: Disks,
    components: Components,
    counters: CounterStore,
}

impl StatsCollector {
    pub fn new() -> Self {
        let mut system = System::new_all();
        // Baseline for CPU deltas; the first collect still reads near zero.
        system.refresh_cpu_usage();
        Self {
            system,
            networks: Networks::new_with_refreshed_list(),
            disks: Disks::new_with_refreshed_list(),
            components: Components::new_with_refreshed_list(),
            counters: CounterStore::new(),
        }
    }

    /// Samples every metric category into one [`Snapshot`]. A failing
    /// source lands in its own slot as an error Sample; this function
    /// itself never fails, and every category key is always present.
    pub async fn collect(&mut self, config: &CollectorConfig) -> Snapshot {
        self.system.refresh_cpu_usage();
        self.system.refresh_memory();
        self.system.refresh_processes(ProcessesToUpdate::All, true);
        self.networks.refresh(true);
        self.disks.refresh(true);
        self.components.refresh(true);
        let now = Instant::now();

        // External tools run concurrently; each carries its own timeout.
        let (amd, nvidia, containers) =
            tokio::join!(radeontop::collect(), nvidia::collect(), docker::collect());

        let snapshot = Snapshot {
            timestamp: Utc::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            cpu: Sample::Ok(cpu::collect(&self.system)),
            ram: Sample::Ok(memory::collect(&self.system)),
            storage: Sample::Ok(storage::collect(&self.disks, &config.storage_paths)),
            network: Sample::Ok(network::collect(
                &self.networks,
                &mut self.counters,
                now,
            )),
            uptime: Sample::Ok(load::uptime_string()),
            load_average: Sample::Ok(load::load_average()),
            processes: Sample::Ok(processes::collect(&self.system)),
            sensors: Sample::Ok(sensors::collect(&self.components)),
            gpu_nvidia: sample("gpu_nvidia", nvidia),
            gpu_amd: sample("gpu_amd", amd),
            containers: Sample::Ok(containers),
            disk_io: sample("disk_io", diskio::collect(&mut self.counters, now)),
            logs: Sample::Ok(logs::collect(&config.log_files)),
        };
        // Baselines for resources that stopped reporting this cycle are dead.
        self.counters.prune_stale(now);
        snapshot
    }
}

impl Default for StatsCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Folds a fallible source result into its snapshot slot, logging failures
/// so a broken source stays visible without stopping the cycle.
fn sample<T>(source: &'static str, result: crate::error::Result<T>) -> Sample<T> {
    match result {
        Ok(value) => Sample::Ok(value),
        Err(e) => {
            tracing::warn!(source, error = %e, "metric source failed");
            Sample::err(e.to_string())
        }
    }
}
