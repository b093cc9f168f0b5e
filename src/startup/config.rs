//! Bot configuration.
//!
//! Built from defaults, then overlaid with `STREAMBOT_*` environment
//! variables, then adjusted through the `with_*` builder methods.

use std::net::SocketAddr;
use std::path::PathBuf;

use tracing::warn;

use crate::auth::platform_api::PLATFORM_AUTH_URL;
use crate::transport::companion_app::DEFAULT_PATH;
use crate::transport::discord::{API_BASE, GATEWAY_URL};
use crate::transport::pubsub::PUBSUB_URL;
use crate::transport::twitch_chat::CHAT_URL;

/// Default overlay file name inside the data directory.
pub const STATS_FILE: &str = "apexStats.txt";

pub const DEFAULT_PREFIX: char = '!';
pub const DEFAULT_REDIRECT_URI: &str = "http://localhost:51145/twitch_auth";
pub const DEFAULT_CALLBACK_ADDR: &str = "127.0.0.1:51145";
pub const DEFAULT_COMPANION_ADDR: &str = "127.0.0.1:61337";
pub const DEFAULT_INVITE_LINK: &str = "https://discord.gg/6fP8vWW";

/// Runtime configuration for the bot.
///
/// # Example
///
/// ```ignore
/// use streambot::startup::BotConfig;
///
/// let config = BotConfig::from_env("mybot")
///     .with_open_browser(false)
///     .with_data_dir("/var/lib/streambot");
/// ```
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Login name the bot chats as.
    pub chat_identity: String,
    /// Channel to join (defaults to the chat identity).
    pub channel: String,
    pub command_prefix: char,
    /// Link handed out by the `discord` command.
    pub invite_link: String,
    /// Redirect URI registered with the platform application.
    pub redirect_uri: String,
    /// Where the authorization callback listener binds.
    pub callback_addr: SocketAddr,
    /// Where the companion-app feed listens.
    pub companion_addr: SocketAddr,
    pub companion_path: String,
    /// Directory for the access list, counters and file secrets.
    pub data_dir: PathBuf,
    /// Overlay file override; `None` means `<data_dir>/apexStats.txt`.
    pub stats_file: Option<PathBuf>,
    pub auth_url: String,
    pub chat_url: String,
    pub pubsub_url: String,
    pub discord_gateway_url: String,
    pub discord_api_base: String,
    /// Remote secret vault; `None` selects the file store.
    pub vault_url: Option<String>,
    /// Open the system browser during interactive sign-in.
    pub open_browser: bool,
}

fn parse_addr(value: &str) -> SocketAddr {
    // Both defaults are valid literals.
    value
        .parse()
        .unwrap_or_else(|_| SocketAddr::from(([127, 0, 0, 1], 0)))
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            chat_identity: String::new(),
            channel: String::new(),
            command_prefix: DEFAULT_PREFIX,
            invite_link: DEFAULT_INVITE_LINK.to_string(),
            redirect_uri: DEFAULT_REDIRECT_URI.to_string(),
            callback_addr: parse_addr(DEFAULT_CALLBACK_ADDR),
            companion_addr: parse_addr(DEFAULT_COMPANION_ADDR),
            companion_path: DEFAULT_PATH.to_string(),
            data_dir: PathBuf::from("data"),
            stats_file: None,
            auth_url: PLATFORM_AUTH_URL.to_string(),
            chat_url: CHAT_URL.to_string(),
            pubsub_url: PUBSUB_URL.to_string(),
            discord_gateway_url: GATEWAY_URL.to_string(),
            discord_api_base: API_BASE.to_string(),
            vault_url: None,
            open_browser: true,
        }
    }
}

impl BotConfig {
    /// Defaults for the given chat identity.
    pub fn new(chat_identity: impl Into<String>) -> Self {
        let chat_identity = chat_identity.into();
        Self {
            channel: chat_identity.to_lowercase(),
            chat_identity,
            ..Self::default()
        }
    }

    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = channel.into().trim_start_matches('#').to_lowercase();
        self
    }

    pub fn with_command_prefix(mut self, prefix: char) -> Self {
        self.command_prefix = prefix;
        self
    }

    pub fn with_invite_link(mut self, link: impl Into<String>) -> Self {
        self.invite_link = link.into();
        self
    }

    pub fn with_redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.redirect_uri = uri.into();
        self
    }

    pub fn with_callback_addr(mut self, addr: SocketAddr) -> Self {
        self.callback_addr = addr;
        self
    }

    pub fn with_companion_addr(mut self, addr: SocketAddr) -> Self {
        self.companion_addr = addr;
        self
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    pub fn with_stats_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.stats_file = Some(path.into());
        self
    }

    pub fn with_auth_url(mut self, url: impl Into<String>) -> Self {
        self.auth_url = url.into();
        self
    }

    pub fn with_vault_url(mut self, url: impl Into<String>) -> Self {
        self.vault_url = Some(url.into());
        self
    }

    pub fn with_open_browser(mut self, open: bool) -> Self {
        self.open_browser = open;
        self
    }

    /// Overlay file the Apex tracker writes.
    pub fn stats_path(&self) -> PathBuf {
        self.stats_file
            .clone()
            .unwrap_or_else(|| self.data_dir.join(STATS_FILE))
    }

    /// Defaults for `chat_identity` with `STREAMBOT_*` overrides applied.
    ///
    /// Unparseable addresses are logged and the default is kept.
    pub fn from_env(chat_identity: impl Into<String>) -> Self {
        let mut config = Self::new(chat_identity);

        if let Some(channel) = env_value("STREAMBOT_CHANNEL") {
            config = config.with_channel(channel);
        }
        if let Some(prefix) = env_value("STREAMBOT_PREFIX").and_then(|p| p.chars().next()) {
            config = config.with_command_prefix(prefix);
        }
        if let Some(dir) = env_value("STREAMBOT_DATA_DIR") {
            config = config.with_data_dir(dir);
        }
        if let Some(path) = env_value("STREAMBOT_STATS_FILE") {
            config = config.with_stats_file(path);
        }
        if let Some(uri) = env_value("STREAMBOT_REDIRECT_URI") {
            config = config.with_redirect_uri(uri);
        }
        if let Some(addr) = env_addr("STREAMBOT_CALLBACK_ADDR") {
            config = config.with_callback_addr(addr);
        }
        if let Some(addr) = env_addr("STREAMBOT_COMPANION_ADDR") {
            config = config.with_companion_addr(addr);
        }
        if let Some(url) = env_value("STREAMBOT_VAULT_URL") {
            config = config.with_vault_url(url);
        }
        if let Some(url) = env_value("STREAMBOT_AUTH_URL") {
            config = config.with_auth_url(url);
        }
        if std::env::var("STREAMBOT_NO_BROWSER").is_ok() {
            config = config.with_open_browser(false);
        }

        config
    }
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_addr(key: &str) -> Option<SocketAddr> {
    let value = env_value(key)?;
    match value.parse() {
        Ok(addr) => Some(addr),
        Err(e) => {
            warn!("Ignoring {}={}: {}", key, value, e);
            None
        }
    }
}
