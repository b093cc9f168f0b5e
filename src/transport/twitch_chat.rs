//! Primary chat client: IRC over WebSocket.
//!
//! Logs in with the token from the [`TokenSource`], joins one channel,
//! turns `PRIVMSG` lines into [`InboundCommand`]s and writes queued replies
//! back as `PRIVMSG`. A login rejection triggers a token renewal before the
//! next connection attempt.

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

use super::irc::{self, IrcMessage};
use super::{connect_ws, wait_before_retry, Backoff, WsSink};
use crate::app::Shutdown;
use crate::error::TransportError;
use crate::models::{BotEvent, InboundCommand, Transport};
use crate::traits::{ReplySink, TokenSource};

/// Default chat endpoint.
pub const CHAT_URL: &str = "wss://irc-ws.chat.twitch.tv:443";

/// Outbound reply queue depth.
pub const OUTGOING_CAPACITY: usize = 64;

#[derive(Debug, Clone)]
pub struct PrimaryChatConfig {
    pub url: String,
    /// Login name of the bot account.
    pub nick: String,
    /// Channel to join, without `#`.
    pub channel: String,
}

/// Reply handle for the primary chat. Replies go to the joined channel, so
/// the channel reference is ignored.
#[derive(Debug, Clone)]
pub struct PrimaryChatSink {
    tx: mpsc::Sender<String>,
}

impl PrimaryChatSink {
    /// A sink and the queue the chat client drains.
    pub fn channel() -> (Self, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(OUTGOING_CAPACITY);
        (Self { tx }, rx)
    }
}

#[async_trait]
impl ReplySink for PrimaryChatSink {
    /// Never waits: while the client is reconnecting a full queue drops
    /// the reply so other transports keep being served.
    async fn send(&self, _channel: Option<&str>, text: &str) -> Result<(), TransportError> {
        match self.tx.try_send(text.to_string()) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                warn!("Primary chat queue is full; dropping reply");
                Err(TransportError::SendFailed("outgoing queue full".to_string()))
            }
            Err(TrySendError::Closed(_)) => Err(TransportError::Shutdown),
        }
    }
}

/// What the client should do with one inbound line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineAction {
    Pong(String),
    Command(InboundCommand),
    LoginFailed(String),
    Reconnect,
    Welcome,
    Joined(String),
    Ignore,
}

/// Classify one IRC line. `own_nick` filters out our own echoes.
pub fn interpret_line(line: &str, own_nick: &str) -> LineAction {
    let Some(msg) = IrcMessage::parse(line) else {
        return LineAction::Ignore;
    };

    match msg.command.as_str() {
        "PING" => LineAction::Pong(msg.trailing().unwrap_or("tmi.twitch.tv").to_string()),
        "RECONNECT" => LineAction::Reconnect,
        "001" => LineAction::Welcome,
        "NOTICE" => {
            let text = msg.trailing().unwrap_or_default();
            if text.contains("Login authentication failed")
                || text.contains("Improperly formatted auth")
            {
                LineAction::LoginFailed(text.to_string())
            } else {
                debug!("Chat notice: {}", text);
                LineAction::Ignore
            }
        }
        "JOIN" if msg.nick().is_some_and(|n| n.eq_ignore_ascii_case(own_nick)) => {
            LineAction::Joined(msg.params.first().cloned().unwrap_or_default())
        }
        "PRIVMSG" => privmsg_to_command(&msg, own_nick)
            .map(LineAction::Command)
            .unwrap_or(LineAction::Ignore),
        _ => LineAction::Ignore,
    }
}

fn privmsg_to_command(msg: &IrcMessage, own_nick: &str) -> Option<InboundCommand> {
    let login = msg.nick()?;
    if login.eq_ignore_ascii_case(own_nick) {
        return None;
    }
    let text = msg.trailing()?;
    let caller = msg.tag("user-id").unwrap_or(login);
    Some(InboundCommand::new(Transport::PrimaryChat, text, caller).privileged(msg.is_moderator()))
}

enum SessionEnd {
    Shutdown,
    Reconnect,
}

/// Run the chat client until shutdown.
pub async fn run_primary_chat(
    config: PrimaryChatConfig,
    tokens: Arc<dyn TokenSource>,
    events: mpsc::Sender<BotEvent>,
    mut outgoing: mpsc::Receiver<String>,
    mut shutdown: Shutdown,
) {
    let mut backoff = Backoff::default();

    while !shutdown.is_triggered() {
        let token = match tokens.current_token().await {
            Some(token) => token,
            None => match tokens.renew_token().await {
                Ok(token) => token,
                Err(e) => {
                    error!("No chat token available: {}", e);
                    if wait_before_retry(&mut backoff, &mut shutdown).await {
                        continue;
                    }
                    break;
                }
            },
        };

        match session(&config, &token, &events, &mut outgoing, &mut shutdown, &mut backoff).await {
            Ok(SessionEnd::Shutdown) => break,
            Ok(SessionEnd::Reconnect) => {
                info!("Chat server asked us to reconnect");
                continue;
            }
            Err(TransportError::AuthRejected(reason)) => {
                warn!("Chat login rejected ({}); renewing token", reason);
                if let Err(e) = tokens.renew_token().await {
                    error!("Token renewal failed: {}", e);
                }
            }
            Err(e) if e.is_retryable() => warn!("Chat connection lost: {}", e),
            Err(e) => {
                error!("Primary chat failed: {}", e);
                break;
            }
        }

        if !wait_before_retry(&mut backoff, &mut shutdown).await {
            break;
        }
    }

    info!("Primary chat stopped");
}

async fn session(
    config: &PrimaryChatConfig,
    token: &str,
    events: &mpsc::Sender<BotEvent>,
    outgoing: &mut mpsc::Receiver<String>,
    shutdown: &mut Shutdown,
    backoff: &mut Backoff,
) -> Result<SessionEnd, TransportError> {
    let (mut sink, mut source) = connect_ws(&config.url).await?;
    debug!("Connected to {}", config.url);

    for line in irc::login_lines(token, &config.nick, &config.channel) {
        send_line(&mut sink, line).await?;
    }

    loop {
        tokio::select! {
            frame = source.next() => {
                let text = match frame {
                    Some(Ok(Message::Text(text))) => text,
                    Some(Ok(Message::Ping(data))) => {
                        let _ = sink.send(Message::Pong(data)).await;
                        continue;
                    }
                    Some(Ok(Message::Close(_))) | None => return Err(TransportError::Disconnected),
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => return Err(TransportError::ConnectionFailed(e.to_string())),
                };

                for line in text.lines().filter(|l| !l.is_empty()) {
                    match interpret_line(line, &config.nick) {
                        LineAction::Pong(param) => {
                            debug!("PING from chat server");
                            send_line(&mut sink, irc::pong(&param)).await?;
                        }
                        LineAction::Command(cmd) => {
                            if events.send(BotEvent::Command(cmd)).await.is_err() {
                                return Ok(SessionEnd::Shutdown);
                            }
                        }
                        LineAction::LoginFailed(reason) => {
                            return Err(TransportError::AuthRejected(reason));
                        }
                        LineAction::Reconnect => return Ok(SessionEnd::Reconnect),
                        LineAction::Welcome => {
                            backoff.reset();
                            info!("Logged in to chat as {}", config.nick);
                        }
                        LineAction::Joined(channel) => info!("Joined {}", channel),
                        LineAction::Ignore => {}
                    }
                }
            }
            reply = outgoing.recv() => match reply {
                Some(text) => send_line(&mut sink, irc::privmsg(&config.channel, &text)).await?,
                None => return Ok(SessionEnd::Shutdown),
            },
            _ = shutdown.wait() => {
                let _ = sink.close().await;
                return Ok(SessionEnd::Shutdown);
            }
        }
    }
}

async fn send_line(sink: &mut WsSink, line: String) -> Result<(), TransportError> {
    sink.send(Message::Text(line))
        .await
        .map_err(|e| TransportError::SendFailed(e.to_string()))
}
