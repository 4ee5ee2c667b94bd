use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::StreamExt;
use pulsemon_collector::{CollectorConfig, StatsCollector};
use pulsemon_common::UPDATE_STATS_EVENT;
use pulsemon_server::app::build_app;
use pulsemon_server::broadcast::Broadcaster;
use pulsemon_server::state::AppState;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

const FRAME_DEADLINE: Duration = Duration::from_secs(30);

type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// App and state wired like `main`, served on an ephemeral loopback port.
async fn spawn_server(interval: Duration) -> (SocketAddr, Arc<Broadcaster>) {
    let broadcaster = Broadcaster::new(
        StatsCollector::new(),
        CollectorConfig::default(),
        interval,
    );
    let state = AppState {
        broadcaster: Arc::clone(&broadcaster),
    };
    let app = build_app(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });
    (addr, broadcaster)
}

async fn next_json(ws: &mut WsClient) -> serde_json::Value {
    loop {
        let msg = timeout(FRAME_DEADLINE, ws.next())
            .await
            .expect("frame within the deadline")
            .expect("connection still open")
            .expect("clean websocket frame");
        if msg.is_text() {
            let text = msg.into_text().unwrap();
            return serde_json::from_str(&text).unwrap();
        }
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn late_viewer_gets_a_snapshot_without_waiting_for_the_cycle() {
    let (addr, broadcaster) = spawn_server(Duration::from_secs(60)).await;

    // The first viewer activates the cycle. It receives its connect
    // snapshot and the cycle's initial frame, in whichever order; once both
    // are here the cycle is mid-sleep for a minute.
    let (mut first, _) = connect_async(format!("ws://{addr}/ws")).await.unwrap();
    next_json(&mut first).await;
    next_json(&mut first).await;
    assert!(broadcaster.is_active(), "first viewer starts the cycle");

    // A viewer joining now can only be served on demand.
    let (mut second, _) = connect_async(format!("ws://{addr}/ws")).await.unwrap();
    let hello = next_json(&mut second).await;
    assert_eq!(hello["event"], UPDATE_STATS_EVENT);
    assert!(hello["data"]["timestamp"].is_string());
    assert!(hello["data"]["cpu"].is_object());
    assert!(hello["data"].get("containers").is_some());

    // And only once: nothing else arrives until the interval elapses.
    let extra = timeout(Duration::from_secs(1), second.next()).await;
    assert!(extra.is_err(), "no cycle frame while the cycle sleeps");
}

#[tokio::test(flavor = "multi_thread")]
async fn full_stream_relays_cycles_to_every_viewer() {
    let (addr, broadcaster) = spawn_server(Duration::from_millis(200)).await;

    let (mut first, _) = connect_async(format!("ws://{addr}/ws")).await.unwrap();
    let snapshot = next_json(&mut first).await;
    assert_eq!(snapshot["event"], UPDATE_STATS_EVENT);

    for _ in 0..2 {
        let frame = next_json(&mut first).await;
        assert_eq!(frame["event"], UPDATE_STATS_EVENT);
        assert!(frame["data"]["timestamp"].is_string());
    }

    // A viewer joining mid-stream gets its own snapshot, then live frames.
    let (mut second, _) = connect_async(format!("ws://{addr}/ws")).await.unwrap();
    let hello = next_json(&mut second).await;
    assert_eq!(hello["event"], UPDATE_STATS_EVENT);
    let relayed = next_json(&mut second).await;
    assert_eq!(relayed["event"], UPDATE_STATS_EVENT);
    assert_eq!(broadcaster.subscriber_count(), 2);

    // Closing the connection drops its subscription server-side.
    second.close(None).await.unwrap();
    let deadline = Instant::now() + Duration::from_secs(5);
    while broadcaster.subscriber_count() > 1 && Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert_eq!(
        broadcaster.subscriber_count(),
        1,
        "closed viewer must be unsubscribed"
    );

    // The remaining viewer keeps receiving.
    let frame = next_json(&mut first).await;
    assert_eq!(frame["event"], UPDATE_STATS_EVENT);
}
