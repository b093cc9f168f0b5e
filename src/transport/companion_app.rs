//! Game telemetry feed from the desktop companion app.
//!
//! A local WebSocket server. Every text frame is a JSON envelope
//! `{"game": "...", "data": {...}}`; Apex updates go to the tracker.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use futures_util::StreamExt;
use serde::Deserialize;
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::app::Shutdown;
use crate::stats::ApexTracker;

pub const DEFAULT_PATH: &str = "/overwolf";

#[derive(Debug, Clone)]
pub struct CompanionFeedConfig {
    pub addr: SocketAddr,
    pub path: String,
}

#[derive(Debug, Deserialize)]
pub struct TelemetryEnvelope {
    pub game: String,
    #[serde(default)]
    pub data: Value,
}

/// Route one frame to the matching accumulator.
///
/// Returns whether the overlay changed. Malformed frames and unknown games
/// are logged and skipped.
pub fn handle_frame(tracker: &ApexTracker, text: &str) -> bool {
    let envelope: TelemetryEnvelope = match serde_json::from_str(text) {
        Ok(envelope) => envelope,
        Err(e) => {
            warn!("Skipping malformed telemetry frame: {}", e);
            return false;
        }
    };
    debug!("Telemetry for {}: {}", envelope.game, envelope.data);

    match envelope.game.as_str() {
        "APEX" => match tracker.ingest(&envelope.data) {
            Ok(changed) => changed,
            Err(e) => {
                warn!("Failed to update Apex overlay: {:#}", e);
                false
            }
        },
        other => {
            debug!("No accumulator for game {}", other);
            false
        }
    }
}

/// Start the feed server.
///
/// Returns the server task and the bound address (useful with port 0).
pub async fn start_companion_server_on(
    config: &CompanionFeedConfig,
    tracker: Arc<ApexTracker>,
    mut shutdown: Shutdown,
) -> color_eyre::Result<(JoinHandle<()>, SocketAddr)> {
    let app = Router::new()
        .route(&config.path, get(websocket_handler))
        .with_state(tracker);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    let actual_addr = listener.local_addr()?;

    info!("Companion feed listening on ws://{}{}", actual_addr, config.path);

    let handle = tokio::spawn(async move {
        let server = axum::serve(listener, app).with_graceful_shutdown(async move {
            shutdown.wait().await;
        });
        if let Err(e) = server.await {
            tracing::error!("Companion feed server error: {}", e);
        }
    });

    Ok((handle, actual_addr))
}

async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(tracker): State<Arc<ApexTracker>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_websocket(socket, tracker))
}

async fn handle_websocket(mut socket: WebSocket, tracker: Arc<ApexTracker>) {
    info!("Companion app connected");
    while let Some(msg) = socket.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                handle_frame(&tracker, &text);
            }
            Ok(Message::Close(_)) => break,
            Err(e) => {
                debug!("Companion socket error: {}", e);
                break;
            }
            _ => {}
        }
    }
    info!("Companion app disconnected");
}
