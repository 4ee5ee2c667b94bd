use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use pulsemon_collector::{CollectorConfig, StatsCollector};
use tokio::sync::broadcast;

/// Frames buffered for a slow receiver before it starts skipping.
const CHANNEL_CAPACITY: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SchedulerState {
    Idle,
    Active,
}

/// Periodic sampling plus fan-out.
///
/// Construction is cheap and samples nothing. The cycle task starts on the
/// first [`ensure_active`](Broadcaster::ensure_active) call and then runs
/// for the life of the process, whether or not anyone is still listening.
/// Each cycle serializes the snapshot exactly once and fans the shared
/// buffer out to every subscriber.
pub struct Broadcaster {
    collector: Arc<tokio::sync::Mutex<StatsCollector>>,
    config: CollectorConfig,
    interval: Duration,
    tx: broadcast::Sender<Arc<str>>,
    state: Mutex<SchedulerState>,
}

impl Broadcaster {
    pub fn new(
        collector: StatsCollector,
        config: CollectorConfig,
        interval: Duration,
    ) -> Arc<Self> {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Arc::new(Self {
            collector: Arc::new(tokio::sync::Mutex::new(collector)),
            config,
            interval,
            tx,
            state: Mutex::new(SchedulerState::Idle),
        })
    }

    /// Starts the cycle task if it is not already running. Returns whether
    /// this call performed the idle-to-active transition; repeat calls are
    /// no-ops, so any number of viewers share one cycle task.
    pub fn ensure_active(&self) -> bool {
        let mut state = self.state.lock().unwrap();
        if *state == SchedulerState::Active {
            return false;
        }
        *state = SchedulerState::Active;
        tracing::info!(
            interval_ms = self.interval.as_millis() as u64,
            "starting broadcast cycle"
        );
        tokio::spawn(run_cycles(
            Arc::clone(&self.collector),
            self.config.clone(),
            self.interval,
            self.tx.clone(),
        ));
        true
    }

    pub fn is_active(&self) -> bool {
        *self.state.lock().unwrap() == SchedulerState::Active
    }

    /// New receiver of push frames. Subscribe before sending the
    /// connect-time snapshot so no cycle frame can slip between the two.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<str>> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// One on-demand sample serialized into a push frame. The gateway uses
    /// this for the connect-time snapshot; the cycle task uses the same
    /// path, so both produce identical frames.
    pub async fn collect_event(&self) -> Result<Arc<str>> {
        build_frame(&self.collector, &self.config).await
    }
}

async fn build_frame(
    collector: &tokio::sync::Mutex<StatsCollector>,
    config: &CollectorConfig,
) -> Result<Arc<str>> {
    let snapshot = {
        let mut collector = collector.lock().await;
        collector.collect(config).await
    };
    let frame = serde_json::to_string(&snapshot.as_event())?;
    Ok(Arc::from(frame))
}

async fn run_cycles(
    collector: Arc<tokio::sync::Mutex<StatsCollector>>,
    config: CollectorConfig,
    interval: Duration,
    tx: broadcast::Sender<Arc<str>>,
) {
    loop {
        match build_frame(&collector, &config).await {
            // A send error only means nobody is subscribed right now.
            Ok(frame) => {
                let _ = tx.send(frame);
            }
            Err(e) => {
                tracing::error!(error = %e, "broadcast cycle failed to build a frame");
            }
        }
        tokio::time::sleep(interval).await;
    }
}
