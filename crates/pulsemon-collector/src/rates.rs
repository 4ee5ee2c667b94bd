use std::collections::HashMap;
use std::time::Instant;

/// Cumulative counters for one keyed resource at one point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterRecord {
    pub bytes_in: u64,
    pub bytes_out: u64,
    pub ops_in: u64,
    pub ops_out: u64,
}

/// Per-second rates derived from two successive [`CounterRecord`]s.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RateResult {
    pub bytes_in_per_sec: f64,
    pub bytes_out_per_sec: f64,
    pub ops_in_per_sec: f64,
    pub ops_out_per_sec: f64,
}

/// Remembers the previous counter sample per resource key so each cycle can
/// turn cumulative totals into rates.
///
/// The first sample for a key yields zero rates. A counter that moves
/// backwards (device reset, counter wraparound) yields zero for that field
/// until the next cycle re-establishes a baseline. Keys are independent:
/// interfaces and disks come and go without disturbing each other.
#[derive(Debug, Default)]
pub struct CounterStore {
    prev: HashMap<String, (CounterRecord, Instant)>,
}

impl CounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of resource keys currently holding a baseline.
    pub fn tracked(&self) -> usize {
        self.prev.len()
    }

    /// Drops every baseline that was not refreshed at `now`. Called once per
    /// cycle so interfaces and disks that vanish (unplugged, veth churn) do
    /// not leave stale entries behind.
    pub fn prune_stale(&mut self, now: Instant) {
        self.prev.retain(|_, value| value.1 == now);
    }

    /// Computes rates against the stored baseline for `key`, then replaces
    /// the baseline with `current` regardless of the outcome.
    pub fn compute_rate(&mut self, key: &str, current: CounterRecord, now: Instant) -> RateResult {
        let rates = match self.prev.get(key) {
            None => RateResult::default(),
            Some((prev, taken_at)) => {
                let mut elapsed = now.duration_since(*taken_at).as_secs_f64();
                // Clock anomaly guard: a non-positive interval counts as 1s.
                if elapsed <= 0.0 {
                    elapsed = 1.0;
                }
                RateResult {
                    bytes_in_per_sec: field_rate(prev.bytes_in, current.bytes_in, elapsed),
                    bytes_out_per_sec: field_rate(prev.bytes_out, current.bytes_out, elapsed),
                    ops_in_per_sec: field_rate(prev.ops_in, current.ops_in, elapsed),
                    ops_out_per_sec: field_rate(prev.ops_out, current.ops_out, elapsed),
                }
            }
        };
        self.prev.insert(key.to_string(), (current, now));
        rates
    }
}

/// Zero when the counter moved backwards, delta over elapsed otherwise.
fn field_rate(prev: u64, current: u64, elapsed: f64) -> f64 {
    if current < prev {
        0.0
    } else {
        (current - prev) as f64 / elapsed
    }
}

/// Rounds to two decimal places, the precision used across the wire format.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
