//! Channel event notifications (PubSub over WebSocket).
//!
//! Subscribes to channel points, bits, subscriptions, follows and raids for
//! the authenticated channel. A fulfilled reward is announced in the
//! primary chat; everything else is logged.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use super::{connect_ws, wait_before_retry, Backoff};
use crate::app::Shutdown;
use crate::error::TransportError;
use crate::models::{BotEvent, RewardRedemption, Transport};
use crate::traits::TokenSource;

/// Default event endpoint.
pub const PUBSUB_URL: &str = "wss://pubsub-edge.twitch.tv";

/// Keep-alive interval required by the server.
pub const PING_INTERVAL: Duration = Duration::from_secs(4 * 60);

#[derive(Debug, Clone)]
pub struct PubSubConfig {
    pub url: String,
    /// Numeric id of the channel to listen to.
    pub channel_id: String,
}

/// Topics for `channel_id`.
pub fn topics(channel_id: &str) -> Vec<String> {
    [
        "channel-points-channel-v1",
        "channel-bits-events-v2",
        "channel-subscribe-events-v1",
        "following",
        "raid",
    ]
    .iter()
    .map(|topic| format!("{}.{}", topic, channel_id))
    .collect()
}

/// The LISTEN request frame.
pub fn listen_frame(channel_id: &str, token: &str) -> String {
    json!({
        "type": "LISTEN",
        "nonce": uuid::Uuid::new_v4().simple().to_string(),
        "data": {
            "topics": topics(channel_id),
            "auth_token": token,
        }
    })
    .to_string()
}

#[derive(Debug, Deserialize)]
struct Frame {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    data: Option<FrameData>,
}

#[derive(Debug, Deserialize)]
struct FrameData {
    topic: String,
    /// JSON document encoded as a string.
    message: String,
}

#[derive(Debug, Deserialize)]
struct ChannelPointsMessage {
    #[serde(rename = "type")]
    kind: String,
    data: ChannelPointsData,
}

#[derive(Debug, Deserialize)]
struct ChannelPointsData {
    redemption: Redemption,
}

#[derive(Debug, Deserialize)]
struct Redemption {
    user: RedemptionUser,
    reward: Reward,
    status: String,
}

#[derive(Debug, Deserialize)]
struct RedemptionUser {
    #[serde(default)]
    display_name: Option<String>,
    login: String,
}

#[derive(Debug, Deserialize)]
struct Reward {
    title: String,
}

/// What one server frame means for the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PubSubAction {
    Pong,
    Reconnect,
    Listening,
    ListenFailed(String),
    Redemption(RewardRedemption),
    /// Any other notification, kept for logging.
    Notification { topic: String, message: String },
}

/// Classify one server frame.
pub fn interpret_frame(text: &str) -> Result<PubSubAction, TransportError> {
    let frame: Frame =
        serde_json::from_str(text).map_err(|e| TransportError::Protocol(e.to_string()))?;

    match frame.kind.as_str() {
        "PONG" => Ok(PubSubAction::Pong),
        "RECONNECT" => Ok(PubSubAction::Reconnect),
        "RESPONSE" => match frame.error.filter(|e| !e.is_empty()) {
            Some(error) => Ok(PubSubAction::ListenFailed(error)),
            None => Ok(PubSubAction::Listening),
        },
        "MESSAGE" => {
            let data = frame
                .data
                .ok_or_else(|| TransportError::Protocol("MESSAGE without data".to_string()))?;
            if data.topic.starts_with("channel-points-channel-v1.") {
                if let Some(redemption) = parse_redemption(&data.message) {
                    return Ok(PubSubAction::Redemption(redemption));
                }
            }
            Ok(PubSubAction::Notification {
                topic: data.topic,
                message: data.message,
            })
        }
        other => Err(TransportError::Protocol(format!(
            "unexpected frame type {}",
            other
        ))),
    }
}

fn parse_redemption(message: &str) -> Option<RewardRedemption> {
    let parsed: ChannelPointsMessage = serde_json::from_str(message).ok()?;
    if parsed.kind != "reward-redeemed" && parsed.kind != "redemption-status-update" {
        return None;
    }
    let redemption = parsed.data.redemption;
    Some(RewardRedemption {
        reward_title: redemption.reward.title,
        user_display_name: redemption
            .user
            .display_name
            .filter(|name| !name.is_empty())
            .unwrap_or(redemption.user.login),
        status: redemption.status,
    })
}

enum SessionEnd {
    Shutdown,
    Reconnect,
}

/// Run the notification client until shutdown.
pub async fn run_pubsub(
    config: PubSubConfig,
    tokens: Arc<dyn TokenSource>,
    events: mpsc::Sender<BotEvent>,
    mut shutdown: Shutdown,
) {
    let mut backoff = Backoff::default();

    while !shutdown.is_triggered() {
        let Some(token) = tokens.current_token().await else {
            warn!("No token for event notifications yet");
            if !wait_before_retry(&mut backoff, &mut shutdown).await {
                break;
            }
            continue;
        };

        match session(&config, &token, &events, &mut shutdown, &mut backoff).await {
            Ok(SessionEnd::Shutdown) => break,
            Ok(SessionEnd::Reconnect) => {
                info!("Event service asked us to reconnect");
                continue;
            }
            Err(TransportError::AuthRejected(reason)) => {
                warn!("Event subscription rejected ({}); renewing token", reason);
                if let Err(e) = tokens.renew_token().await {
                    warn!("Token renewal failed: {}", e);
                }
            }
            Err(e) => warn!("Event connection lost: {}", e),
        }

        if !wait_before_retry(&mut backoff, &mut shutdown).await {
            break;
        }
    }

    info!("Event notifications stopped");
}

async fn session(
    config: &PubSubConfig,
    token: &str,
    events: &mpsc::Sender<BotEvent>,
    shutdown: &mut Shutdown,
    backoff: &mut Backoff,
) -> Result<SessionEnd, TransportError> {
    let (mut sink, mut source) = connect_ws(&config.url).await?;
    sink.send(Message::Text(listen_frame(&config.channel_id, token)))
        .await
        .map_err(|e| TransportError::SendFailed(e.to_string()))?;

    let mut ping = tokio::time::interval(PING_INTERVAL);
    // The first tick fires immediately; skip it.
    ping.tick().await;

    loop {
        tokio::select! {
            frame = source.next() => {
                let text = match frame {
                    Some(Ok(Message::Text(text))) => text,
                    Some(Ok(Message::Close(_))) | None => return Err(TransportError::Disconnected),
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => return Err(TransportError::ConnectionFailed(e.to_string())),
                };

                match interpret_frame(&text) {
                    Ok(PubSubAction::Pong) => debug!("PONG from event service"),
                    Ok(PubSubAction::Reconnect) => return Ok(SessionEnd::Reconnect),
                    Ok(PubSubAction::Listening) => {
                        backoff.reset();
                        info!("Listening for channel events on {}", config.channel_id);
                    }
                    Ok(PubSubAction::ListenFailed(error)) => {
                        return Err(TransportError::AuthRejected(error));
                    }
                    Ok(PubSubAction::Redemption(redemption)) => {
                        info!(
                            "Reward '{}' by {} is {}",
                            redemption.reward_title, redemption.user_display_name, redemption.status
                        );
                        if redemption.is_completed() {
                            let announce = BotEvent::Announce {
                                transport: Transport::PrimaryChat,
                                text: redemption.completion_message(),
                                channel: None,
                            };
                            if events.send(announce).await.is_err() {
                                return Ok(SessionEnd::Shutdown);
                            }
                        }
                    }
                    Ok(PubSubAction::Notification { topic, message }) => {
                        info!("Channel event on {}: {}", topic, message);
                    }
                    Err(e) => warn!("Skipping event frame: {}", e),
                }
            }
            _ = ping.tick() => {
                sink.send(Message::Text(json!({"type": "PING"}).to_string()))
                    .await
                    .map_err(|e| TransportError::SendFailed(e.to_string()))?;
            }
            _ = shutdown.wait() => {
                let _ = sink.close().await;
                return Ok(SessionEnd::Shutdown);
            }
        }
    }
}
