use std::net::SocketAddr;
use std::time::Duration;

use axum::extract::connect_info::ConnectInfo;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use rand::Rng;
use tokio::sync::broadcast::error::RecvError;

use crate::state::AppState;

/// A send still pending after this long means the peer is gone for good.
const SEND_TIMEOUT: Duration = Duration::from_secs(10);

pub async fn upgrade(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state, peer))
}

async fn handle_socket(mut socket: WebSocket, state: AppState, peer: SocketAddr) {
    let conn = connection_id();
    tracing::info!(conn = %conn, peer = %peer, "viewer connected");

    if state.broadcaster.ensure_active() {
        tracing::debug!(conn = %conn, "first viewer, broadcast cycle started");
    }

    // Subscribe before the connect-time snapshot so no cycle frame can fall
    // between the two.
    let mut rx = state.broadcaster.subscribe();

    match state.broadcaster.collect_event().await {
        Ok(frame) => {
            if !send_frame(&mut socket, &frame).await {
                tracing::info!(conn = %conn, "viewer left before first snapshot");
                return;
            }
        }
        Err(e) => {
            tracing::error!(conn = %conn, error = %e, "could not build connect-time snapshot");
            return;
        }
    }

    loop {
        tokio::select! {
            received = rx.recv() => match received {
                Ok(frame) => {
                    if !send_frame(&mut socket, &frame).await {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(conn = %conn, skipped, "viewer too slow, frames skipped");
                }
                Err(RecvError::Closed) => break,
            },
            inbound = socket.recv() => match inbound {
                // Viewers have nothing to say; drain and ignore.
                Some(Ok(_)) => {}
                Some(Err(_)) | None => break,
            },
        }
    }

    tracing::info!(conn = %conn, peer = %peer, "viewer disconnected");
}

async fn send_frame(socket: &mut WebSocket, frame: &str) -> bool {
    matches!(
        tokio::time::timeout(SEND_TIMEOUT, socket.send(Message::Text(frame.to_string().into())))
            .await,
        Ok(Ok(()))
    )
}

/// Short id tying together the log lines of one connection.
fn connection_id() -> String {
    format!("{:08x}", rand::thread_rng().gen::<u32>())
}
