use std::fmt;

use serde::{Deserialize, Serialize};

/// Which chat surface a command arrived on and a reply goes back to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Transport {
    /// The streaming platform's chat.
    PrimaryChat,
    /// The auxiliary messaging platform.
    CompanionChat,
}

impl Transport {
    /// Discriminator used in persisted access-list keys.
    pub fn tag(self) -> &'static str {
        match self {
            Transport::PrimaryChat => "twitch",
            Transport::CompanionChat => "discord",
        }
    }

    /// Inverse of [`Transport::tag`].
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "twitch" => Some(Transport::PrimaryChat),
            "discord" => Some(Transport::CompanionChat),
            _ => None,
        }
    }

    /// Interpret the transport argument of a chat command.
    ///
    /// Only `twitch` (any case) selects the primary transport; everything
    /// else means the companion one.
    pub fn from_command_arg(arg: &str) -> Self {
        if arg.eq_ignore_ascii_case(Transport::PrimaryChat.tag()) {
            Transport::PrimaryChat
        } else {
            Transport::CompanionChat
        }
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_round_trip() {
        for transport in [Transport::PrimaryChat, Transport::CompanionChat] {
            assert_eq!(Transport::from_tag(transport.tag()), Some(transport));
        }
        assert_eq!(Transport::from_tag("irc"), None);
    }

    #[test]
    fn test_command_arg_is_case_insensitive() {
        assert_eq!(Transport::from_command_arg("TWITCH"), Transport::PrimaryChat);
        assert_eq!(Transport::from_command_arg("Twitch"), Transport::PrimaryChat);
        assert_eq!(Transport::from_command_arg("discord"), Transport::CompanionChat);
        assert_eq!(Transport::from_command_arg("anything"), Transport::CompanionChat);
    }
}
