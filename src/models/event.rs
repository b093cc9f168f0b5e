use serde::{Deserialize, Serialize};

use super::Transport;

/// A chat line normalized by a transport adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundCommand {
    pub transport: Transport,
    /// The full message text, prefix included.
    pub text: String,
    /// Stable per-transport user identity (user id where available).
    pub caller: String,
    /// Set by the transport for channel owners and moderators.
    pub is_privileged: bool,
    /// Out-of-band reply reference (the companion chat's channel id).
    pub channel: Option<String>,
}

impl InboundCommand {
    pub fn new(transport: Transport, text: impl Into<String>, caller: impl Into<String>) -> Self {
        Self {
            transport,
            text: text.into(),
            caller: caller.into(),
            is_privileged: false,
            channel: None,
        }
    }

    pub fn privileged(mut self, is_privileged: bool) -> Self {
        self.is_privileged = is_privileged;
        self
    }

    pub fn in_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = Some(channel.into());
        self
    }
}

/// A channel-points reward that changed status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardRedemption {
    pub reward_title: String,
    pub user_display_name: String,
    pub status: String,
}

impl RewardRedemption {
    /// Status the platform reports once the streamer fulfilled a reward.
    pub const ACTION_TAKEN: &'static str = "ACTION_TAKEN";

    pub fn is_completed(&self) -> bool {
        self.status == Self::ACTION_TAKEN
    }

    /// Chat line announcing a fulfilled reward.
    pub fn completion_message(&self) -> String {
        format!(
            "I completed '{}' redeemed by @{}!",
            self.reward_title, self.user_display_name
        )
    }
}

/// Everything the router loop consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotEvent {
    /// A chat line that may be a command.
    Command(InboundCommand),
    /// Unprompted text to post on a transport.
    Announce {
        transport: Transport,
        text: String,
        channel: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_sets_fields() {
        let cmd = InboundCommand::new(Transport::CompanionChat, "!discord", "42")
            .privileged(true)
            .in_channel("chan-1");
        assert!(cmd.is_privileged);
        assert_eq!(cmd.channel.as_deref(), Some("chan-1"));
        assert_eq!(cmd.caller, "42");
    }

    #[test]
    fn test_completion_message() {
        let redemption = RewardRedemption {
            reward_title: "Hydrate".to_string(),
            user_display_name: "Viewer".to_string(),
            status: "ACTION_TAKEN".to_string(),
        };
        assert!(redemption.is_completed());
        assert_eq!(
            redemption.completion_message(),
            "I completed 'Hydrate' redeemed by @Viewer!"
        );
    }

    #[test]
    fn test_unfulfilled_redemption() {
        let redemption = RewardRedemption {
            reward_title: "Hydrate".to_string(),
            user_display_name: "Viewer".to_string(),
            status: "UNFULFILLED".to_string(),
        };
        assert!(!redemption.is_completed());
    }
}
