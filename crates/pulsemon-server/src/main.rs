use std::net::SocketAddr;

use anyhow::Result;
use pulsemon_collector::StatsCollector;
use tokio::signal;
use tracing_subscriber::EnvFilter;

use pulsemon_server::app;
use pulsemon_server::broadcast::Broadcaster;
use pulsemon_server::config::ServerConfig;
use pulsemon_server::state::AppState;

const DEFAULT_CONFIG_PATH: &str = "config/pulsemon.toml";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("pulsemon=info".parse()?))
        .init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let mut config = ServerConfig::load(&config_path)?;
    config.apply_env();
    let interval = config.effective_interval();

    tracing::info!(
        interval_ms = interval.as_millis() as u64,
        storage_paths = config.storage_paths.len(),
        log_files = config.log_files.len(),
        "pulsemon-server starting"
    );

    let broadcaster = Broadcaster::new(StatsCollector::new(), config.collector_config(), interval);
    let state = AppState { broadcaster };
    let app = app::build_app(state);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "listening for viewers");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async {
        signal::ctrl_c().await.ok();
        tracing::info!("shutdown signal received");
    })
    .await?;

    Ok(())
}
