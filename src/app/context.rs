//! Application context.
//!
//! Everything the running bot shares is built once here and handed to the
//! tasks explicitly. There are no globals.

use std::sync::Arc;

use color_eyre::{eyre::WrapErr, Result};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::Shutdown;
use crate::auth::{CredentialManager, ValidateResponse};
use crate::commands::{CommandRouter, ReplyRoutes, RouterLoop};
use crate::models::BotEvent;
use crate::startup::BotConfig;
use crate::state::{AccessControlList, CounterStore};
use crate::stats::ApexTracker;
use crate::storage::BlobStore;
use crate::traits::{ReplySink, SecretStore, TokenSource};
use crate::transport::discord::{run_discord, BOT_TOKEN_SLOT};
use crate::transport::pubsub::run_pubsub;
use crate::transport::twitch_chat::run_primary_chat;
use crate::transport::{
    start_companion_server_on, CompanionFeedConfig, DiscordConfig, DiscordReplySink, PrimaryChatConfig,
    PrimaryChatSink, PubSubConfig,
};

/// Depth of the inbound event queue shared by all transports.
pub const EVENT_CAPACITY: usize = 256;

pub struct AppContext {
    pub config: BotConfig,
    pub secrets: Arc<dyn SecretStore>,
    pub credentials: Arc<CredentialManager>,
    pub acl: Arc<AccessControlList>,
    pub counters: Arc<CounterStore>,
    pub tracker: Arc<ApexTracker>,
    pub events: mpsc::Sender<BotEvent>,
    pub shutdown: Shutdown,
}

impl AppContext {
    /// Load persisted state and assemble the context.
    pub fn new(
        config: BotConfig,
        secrets: Arc<dyn SecretStore>,
        credentials: Arc<CredentialManager>,
        events: mpsc::Sender<BotEvent>,
        shutdown: Shutdown,
    ) -> Result<Self> {
        let store = BlobStore::new(&config.data_dir);
        store.ensure_dir()?;

        let acl = AccessControlList::load(store.clone()).wrap_err("Failed to load access list")?;
        let counters = CounterStore::load(store).wrap_err("Failed to load counters")?;

        let tracker = ApexTracker::new(config.stats_path());
        if let Err(e) = tracker.init() {
            warn!("Could not write the initial stats overlay: {:#}", e);
        }

        Ok(Self {
            config,
            secrets,
            credentials,
            acl: Arc::new(acl),
            counters: Arc::new(counters),
            tracker: Arc::new(tracker),
            events,
            shutdown,
        })
    }

    pub fn command_router(&self) -> CommandRouter {
        CommandRouter::new(
            self.config.command_prefix,
            self.config.invite_link.clone(),
            self.acl.clone(),
            self.counters.clone(),
        )
    }

    fn token_source(&self) -> Arc<dyn TokenSource> {
        self.credentials.clone()
    }

    /// Stored bot token for the companion chat, if any.
    async fn companion_token(&self) -> Option<String> {
        match self.secrets.get_secret(BOT_TOKEN_SLOT).await {
            Ok(token) if !token.is_empty() => Some(token),
            Ok(_) => None,
            Err(e) => {
                warn!("Could not read the Discord bot token: {}", e);
                None
            }
        }
    }

    /// Spawn the router loop and every transport.
    ///
    /// `identity` is the signed-in account; its user id selects the channel
    /// for event notifications.
    pub async fn spawn_services(
        &self,
        identity: &ValidateResponse,
        inbound: mpsc::Receiver<BotEvent>,
    ) -> Vec<JoinHandle<()>> {
        let mut handles = Vec::new();

        let (primary_sink, outgoing) = PrimaryChatSink::channel();
        let primary: Arc<dyn ReplySink> = Arc::new(primary_sink);

        let companion: Option<Arc<dyn ReplySink>> = match self.companion_token().await {
            Some(token) => {
                let config = DiscordConfig {
                    gateway_url: self.config.discord_gateway_url.clone(),
                    api_base: self.config.discord_api_base.clone(),
                    bot_token: token,
                };
                let sink = DiscordReplySink::new(&config.api_base, &config.bot_token);
                handles.push(tokio::spawn(run_discord(
                    config,
                    self.events.clone(),
                    self.shutdown.clone(),
                )));
                Some(Arc::new(sink))
            }
            None => {
                warn!("No Discord bot token stored; Discord transport disabled");
                None
            }
        };

        let router_loop = RouterLoop::new(self.command_router(), ReplyRoutes { primary, companion });
        handles.push(tokio::spawn(router_loop.run(inbound, self.shutdown.clone())));

        handles.push(tokio::spawn(run_primary_chat(
            PrimaryChatConfig {
                url: self.config.chat_url.clone(),
                nick: self.config.chat_identity.to_lowercase(),
                channel: self.config.channel.clone(),
            },
            self.token_source(),
            self.events.clone(),
            outgoing,
            self.shutdown.clone(),
        )));

        handles.push(tokio::spawn(run_pubsub(
            PubSubConfig {
                url: self.config.pubsub_url.clone(),
                channel_id: identity.user_id.clone(),
            },
            self.token_source(),
            self.events.clone(),
            self.shutdown.clone(),
        )));

        let feed = CompanionFeedConfig {
            addr: self.config.companion_addr,
            path: self.config.companion_path.clone(),
        };
        match start_companion_server_on(&feed, self.tracker.clone(), self.shutdown.clone()).await {
            Ok((handle, _)) => handles.push(handle),
            Err(e) => warn!("Companion feed disabled: {:#}", e),
        }

        info!("Started {} background tasks", handles.len());
        handles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::{CapturingPrompt, InMemorySecrets};
    use crate::app::shutdown_channel;
    use crate::auth::{AppCredentials, AuthCallbackSlot, AuthSettings, PlatformAuthClient};
    use crate::models::{InboundCommand, Transport};
    use tempfile::TempDir;

    fn context(dir: &TempDir) -> AppContext {
        let secrets: Arc<dyn SecretStore> = Arc::new(InMemorySecrets::new());
        let manager = CredentialManager::new(
            secrets.clone(),
            PlatformAuthClient::with_base_url("http://127.0.0.1:1".to_string()),
            AppCredentials {
                client_id: String::new(),
                client_secret: String::new(),
            },
            AuthSettings::new("http://localhost:51145/twitch_auth"),
            AuthCallbackSlot::new(),
            Arc::new(CapturingPrompt::new()),
        );
        let (events, _rx) = mpsc::channel(EVENT_CAPACITY);
        let (_trigger, shutdown) = shutdown_channel();
        let config = BotConfig::new("bot").with_data_dir(dir.path().join("data"));
        AppContext::new(config, secrets, Arc::new(manager), events, shutdown).unwrap()
    }

    #[test]
    fn test_new_creates_state_files() {
        let dir = TempDir::new().unwrap();
        let _ctx = context(&dir);
        let data = dir.path().join("data");
        assert!(data.join("access.json").exists());
        assert!(data.join("counters.json").exists());
        assert!(data.join("apexStats.txt").exists());
    }

    #[test]
    fn test_router_uses_shared_state() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir);
        ctx.acl.add(Transport::PrimaryChat, "42");

        let router = ctx.command_router();
        let reply = router.dispatch(&InboundCommand::new(Transport::PrimaryChat, "!counter deaths 2", "42"));
        assert_eq!(reply.as_deref(), Some("deaths: 2"));
        assert_eq!(ctx.counters.get("deaths"), Some(2));
    }

    #[tokio::test]
    async fn test_missing_bot_token_disables_companion() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir);
        assert!(ctx.companion_token().await.is_none());
    }
}
