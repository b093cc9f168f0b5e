//! Transport adapters.
//!
//! Each adapter runs on its own task, normalizes what it receives into
//! [`BotEvent`](crate::models::BotEvent)s for the router, and stops when the
//! shared [`Shutdown`](crate::app::Shutdown) fires.
//!
//! - [`twitch_chat`] - primary chat over IRC-on-WebSocket
//! - [`pubsub`] - channel event notifications
//! - [`discord`] - companion chat (gateway + REST)
//! - [`companion_app`] - game telemetry feed from the desktop companion app

pub mod companion_app;
pub mod discord;
pub mod irc;
pub mod pubsub;
pub mod twitch_chat;

use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::StreamExt;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::app::Shutdown;
use crate::error::TransportError;

pub use companion_app::{start_companion_server_on, CompanionFeedConfig};
pub use discord::{DiscordConfig, DiscordReplySink};
pub use pubsub::PubSubConfig;
pub use twitch_chat::{PrimaryChatConfig, PrimaryChatSink};

pub(crate) type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
pub(crate) type WsSink = SplitSink<WsStream, Message>;
pub(crate) type WsSource = SplitStream<WsStream>;

/// Open a client WebSocket and split it.
pub(crate) async fn connect_ws(url: &str) -> Result<(WsSink, WsSource), TransportError> {
    let (stream, _) = connect_async(url)
        .await
        .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;
    Ok(stream.split())
}

/// Exponential reconnect delay: 1s, 2s, 4s, ... capped.
#[derive(Debug, Clone)]
pub struct Backoff {
    attempt: u32,
    max: Duration,
}

impl Backoff {
    pub const MAX_DELAY: Duration = Duration::from_secs(30);

    pub fn new(max: Duration) -> Self {
        Self { attempt: 0, max }
    }

    /// Delay before the next attempt.
    pub fn next_delay(&mut self) -> Duration {
        let secs = 1u64.checked_shl(self.attempt).unwrap_or(u64::MAX);
        self.attempt = self.attempt.saturating_add(1);
        Duration::from_secs(secs).min(self.max)
    }

    /// Call after a connection was established.
    pub fn reset(&mut self) {
        self.attempt = 0;
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(Self::MAX_DELAY)
    }
}

/// Sleep for the next backoff delay. Returns `false` if shutdown fired
/// first.
pub(crate) async fn wait_before_retry(backoff: &mut Backoff, shutdown: &mut Shutdown) -> bool {
    let delay = backoff.next_delay();
    tracing::info!(
        "Reconnecting in {}s (attempt {})",
        delay.as_secs(),
        backoff.attempt()
    );
    tokio::select! {
        _ = tokio::time::sleep(delay) => true,
        _ = shutdown.wait() => false,
    }
}
