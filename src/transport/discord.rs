//! Companion chat: Discord gateway for inbound messages, REST for replies.
//!
//! Gateway handshake: Hello -> Identify, then heartbeats at the interval the
//! server asked for. Messages from humans become [`InboundCommand`]s that
//! carry their channel id, which the router uses to address the reply.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use super::{connect_ws, wait_before_retry, Backoff, WsSink};
use crate::app::Shutdown;
use crate::error::TransportError;
use crate::models::{BotEvent, InboundCommand, Transport};
use crate::traits::ReplySink;

pub const GATEWAY_URL: &str = "wss://gateway.discord.gg/?v=10&encoding=json";
pub const API_BASE: &str = "https://discord.com/api/v10";

/// Secret slot holding the bot token. Empty disables this transport.
pub const BOT_TOKEN_SLOT: &str = "DiscordBotToken";

/// GUILD_MESSAGES | DIRECT_MESSAGES | MESSAGE_CONTENT
pub const INTENTS: u64 = (1 << 9) | (1 << 12) | (1 << 15);

mod opcode {
    pub const DISPATCH: u8 = 0;
    pub const HEARTBEAT: u8 = 1;
    pub const IDENTIFY: u8 = 2;
    pub const RECONNECT: u8 = 7;
    pub const INVALID_SESSION: u8 = 9;
    pub const HELLO: u8 = 10;
    pub const HEARTBEAT_ACK: u8 = 11;
}

#[derive(Clone)]
pub struct DiscordConfig {
    pub gateway_url: String,
    pub api_base: String,
    pub bot_token: String,
}

impl std::fmt::Debug for DiscordConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordConfig")
            .field("gateway_url", &self.gateway_url)
            .field("api_base", &self.api_base)
            .field("bot_token", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct GatewayPayload {
    op: u8,
    #[serde(default)]
    d: Value,
    #[serde(default)]
    s: Option<u64>,
    #[serde(default)]
    t: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Author {
    id: String,
    #[serde(default)]
    bot: bool,
}

#[derive(Debug, Deserialize)]
struct MessageCreate {
    channel_id: String,
    content: String,
    author: Author,
}

/// What the connection loop should do after one gateway frame.
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayAction {
    /// Start heartbeating and identify.
    Hello { heartbeat_interval: Duration },
    /// Server wants a heartbeat now.
    Heartbeat,
    Ready,
    Command(InboundCommand),
    Reconnect,
    Ignore,
}

/// Per-connection gateway state.
#[derive(Debug, Default)]
pub struct GatewaySession {
    /// Last sequence number, echoed in heartbeats.
    pub sequence: Option<u64>,
    /// Our own user id, learned from READY.
    pub self_id: Option<String>,
}

impl GatewaySession {
    pub fn on_frame(&mut self, text: &str) -> Result<GatewayAction, TransportError> {
        let payload: GatewayPayload =
            serde_json::from_str(text).map_err(|e| TransportError::Protocol(e.to_string()))?;
        if payload.s.is_some() {
            self.sequence = payload.s;
        }

        Ok(match payload.op {
            opcode::HELLO => {
                let millis = payload.d["heartbeat_interval"].as_u64().ok_or_else(|| {
                    TransportError::Protocol("Hello without heartbeat_interval".to_string())
                })?;
                GatewayAction::Hello {
                    heartbeat_interval: Duration::from_millis(millis),
                }
            }
            opcode::HEARTBEAT => GatewayAction::Heartbeat,
            opcode::HEARTBEAT_ACK => GatewayAction::Ignore,
            opcode::RECONNECT | opcode::INVALID_SESSION => GatewayAction::Reconnect,
            opcode::DISPATCH => self.on_dispatch(payload.t.as_deref(), payload.d),
            _ => GatewayAction::Ignore,
        })
    }

    fn on_dispatch(&mut self, event: Option<&str>, data: Value) -> GatewayAction {
        match event {
            Some("READY") => {
                self.self_id = data["user"]["id"].as_str().map(str::to_string);
                GatewayAction::Ready
            }
            Some("MESSAGE_CREATE") => {
                let Ok(message) = serde_json::from_value::<MessageCreate>(data) else {
                    return GatewayAction::Ignore;
                };
                if message.author.bot || self.self_id.as_deref() == Some(message.author.id.as_str()) {
                    return GatewayAction::Ignore;
                }
                GatewayAction::Command(
                    InboundCommand::new(Transport::CompanionChat, message.content, message.author.id)
                        .in_channel(message.channel_id),
                )
            }
            _ => GatewayAction::Ignore,
        }
    }

    pub fn heartbeat_frame(&self) -> String {
        json!({"op": opcode::HEARTBEAT, "d": self.sequence}).to_string()
    }
}

/// The Identify frame for `token`.
pub fn identify_frame(token: &str) -> String {
    json!({
        "op": opcode::IDENTIFY,
        "d": {
            "token": token,
            "intents": INTENTS,
            "properties": {
                "os": std::env::consts::OS,
                "browser": "streambot",
                "device": "streambot",
            }
        }
    })
    .to_string()
}

/// Posts replies through the REST API.
#[derive(Clone)]
pub struct DiscordReplySink {
    client: Client,
    api_base: String,
    bot_token: String,
}

impl DiscordReplySink {
    pub fn new(api_base: &str, bot_token: &str) -> Self {
        Self {
            client: Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
            bot_token: bot_token.to_string(),
        }
    }
}

#[async_trait]
impl ReplySink for DiscordReplySink {
    async fn send(&self, channel: Option<&str>, text: &str) -> Result<(), TransportError> {
        let channel = channel.ok_or(TransportError::NoDestination)?;
        let url = format!("{}/channels/{}/messages", self.api_base, channel);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bot {}", self.bot_token))
            .json(&json!({ "content": text }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::SendFailed(format!(
                "HTTP {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }
        Ok(())
    }
}

/// Run the gateway client until shutdown.
pub async fn run_discord(config: DiscordConfig, events: mpsc::Sender<BotEvent>, mut shutdown: Shutdown) {
    let mut backoff = Backoff::default();

    while !shutdown.is_triggered() {
        match session(&config, &events, &mut shutdown, &mut backoff).await {
            Ok(true) => break,
            Ok(false) => info!("Discord gateway asked us to reconnect"),
            Err(e) => warn!("Discord connection lost: {}", e),
        }
        if !wait_before_retry(&mut backoff, &mut shutdown).await {
            break;
        }
    }

    info!("Discord client stopped");
}

/// Returns `Ok(true)` on shutdown, `Ok(false)` when asked to reconnect.
async fn session(
    config: &DiscordConfig,
    events: &mpsc::Sender<BotEvent>,
    shutdown: &mut Shutdown,
    backoff: &mut Backoff,
) -> Result<bool, TransportError> {
    let (mut sink, mut source) = connect_ws(&config.gateway_url).await?;
    let mut gateway = GatewaySession::default();
    // Replaced once Hello arrives.
    let mut heartbeat = tokio::time::interval(Duration::from_secs(3600));
    heartbeat.tick().await;
    let mut identified = false;

    loop {
        tokio::select! {
            frame = source.next() => {
                let text = match frame {
                    Some(Ok(Message::Text(text))) => text,
                    Some(Ok(Message::Close(frame))) => {
                        let reason = frame
                            .map(|f| format!("{} {}", u16::from(f.code), f.reason))
                            .unwrap_or_default();
                        return Err(TransportError::ConnectionFailed(format!("gateway closed: {}", reason)));
                    }
                    None => return Err(TransportError::Disconnected),
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => return Err(TransportError::ConnectionFailed(e.to_string())),
                };

                match gateway.on_frame(&text) {
                    Ok(GatewayAction::Hello { heartbeat_interval }) => {
                        debug!("Gateway hello, heartbeat every {:?}", heartbeat_interval);
                        heartbeat = tokio::time::interval(heartbeat_interval);
                        heartbeat.tick().await;
                        if !identified {
                            send_text(&mut sink, identify_frame(&config.bot_token)).await?;
                            identified = true;
                        }
                    }
                    Ok(GatewayAction::Heartbeat) => {
                        send_text(&mut sink, gateway.heartbeat_frame()).await?;
                    }
                    Ok(GatewayAction::Ready) => {
                        backoff.reset();
                        info!("Discord bot is ready");
                    }
                    Ok(GatewayAction::Command(cmd)) => {
                        if events.send(BotEvent::Command(cmd)).await.is_err() {
                            return Ok(true);
                        }
                    }
                    Ok(GatewayAction::Reconnect) => return Ok(false),
                    Ok(GatewayAction::Ignore) => {}
                    Err(e) => warn!("Skipping gateway frame: {}", e),
                }
            }
            _ = heartbeat.tick() => {
                debug!("Gateway heartbeat");
                send_text(&mut sink, gateway.heartbeat_frame()).await?;
            }
            _ = shutdown.wait() => {
                let _ = sink.close().await;
                return Ok(true);
            }
        }
    }
}

async fn send_text(sink: &mut WsSink, text: String) -> Result<(), TransportError> {
    sink.send(Message::Text(text))
        .await
        .map_err(|e| TransportError::SendFailed(e.to_string()))
}
