use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::connect_info::MockConnectInfo;
use axum::Router;
use pulsemon_collector::{CollectorConfig, StatsCollector};
use pulsemon_server::app::build_app;
use pulsemon_server::broadcast::Broadcaster;
use pulsemon_server::state::AppState;

pub struct TestContext {
    pub app: Router,
    pub broadcaster: Arc<Broadcaster>,
}

/// App and state wired like `main`, with a caller-chosen interval and a
/// mock peer address so `ConnectInfo` handlers work under `oneshot`.
pub fn build_test_context(interval: Duration) -> TestContext {
    let broadcaster = Broadcaster::new(
        StatsCollector::new(),
        CollectorConfig::default(),
        interval,
    );
    let state = AppState {
        broadcaster: Arc::clone(&broadcaster),
    };
    let app = build_app(state).layer(MockConnectInfo(SocketAddr::from(([127, 0, 0, 1], 4000))));
    TestContext { app, broadcaster }
}
