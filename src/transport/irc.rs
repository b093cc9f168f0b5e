//! IRCv3 line parsing and formatting for the primary chat.
//!
//! Only what the bot needs: message tags, prefix, command, params and the
//! handful of outbound lines used to log in and talk.

use std::collections::HashMap;

/// One parsed IRC line.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IrcMessage {
    pub tags: HashMap<String, String>,
    /// `nick!user@host` or a server name, without the leading `:`.
    pub prefix: Option<String>,
    pub command: String,
    /// Middle params followed by the trailing param (if any).
    pub params: Vec<String>,
}

impl IrcMessage {
    /// Parse a single line (no CR/LF).
    pub fn parse(line: &str) -> Option<Self> {
        let mut rest = line.trim_end_matches(['\r', '\n']);
        let mut msg = IrcMessage::default();

        if let Some(tagged) = rest.strip_prefix('@') {
            let (tags, after) = tagged.split_once(' ')?;
            for tag in tags.split(';') {
                let (key, value) = tag.split_once('=').unwrap_or((tag, ""));
                msg.tags.insert(key.to_string(), unescape_tag_value(value));
            }
            rest = after.trim_start();
        }

        if let Some(prefixed) = rest.strip_prefix(':') {
            let (prefix, after) = prefixed.split_once(' ')?;
            msg.prefix = Some(prefix.to_string());
            rest = after.trim_start();
        }

        let (command, mut params) = match rest.split_once(' ') {
            Some((command, params)) => (command, params),
            None => (rest, ""),
        };
        if command.is_empty() {
            return None;
        }
        msg.command = command.to_string();

        while !params.is_empty() {
            if let Some(trailing) = params.strip_prefix(':') {
                msg.params.push(trailing.to_string());
                break;
            }
            match params.split_once(' ') {
                Some((param, after)) => {
                    if !param.is_empty() {
                        msg.params.push(param.to_string());
                    }
                    params = after;
                }
                None => {
                    msg.params.push(params.to_string());
                    break;
                }
            }
        }

        Some(msg)
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// The last parameter, which carries message text.
    pub fn trailing(&self) -> Option<&str> {
        self.params.last().map(String::as_str)
    }

    /// Nick part of the prefix.
    pub fn nick(&self) -> Option<&str> {
        let prefix = self.prefix.as_deref()?;
        Some(prefix.split_once('!').map_or(prefix, |(nick, _)| nick))
    }

    /// Broadcaster or moderator, judged from the `badges` and `mod` tags.
    pub fn is_moderator(&self) -> bool {
        if self.tag("mod") == Some("1") {
            return true;
        }
        self.tag("badges").is_some_and(|badges| {
            badges.split(',').any(|badge| {
                let name = badge.split_once('/').map_or(badge, |(name, _)| name);
                name == "broadcaster" || name == "moderator"
            })
        })
    }
}

/// Undo IRCv3 tag escaping.
pub fn unescape_tag_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some(':') => out.push(';'),
            Some('s') => out.push(' '),
            Some('r') => out.push('\r'),
            Some('n') => out.push('\n'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

/// Lines that log in and join `channel`.
pub fn login_lines(token: &str, nick: &str, channel: &str) -> Vec<String> {
    vec![
        "CAP REQ :twitch.tv/tags twitch.tv/commands".to_string(),
        format!("PASS oauth:{}", token.trim_start_matches("oauth:")),
        format!("NICK {}", nick.to_lowercase()),
        format!("JOIN #{}", channel.trim_start_matches('#').to_lowercase()),
    ]
}

/// A chat message to `channel`. Line breaks are flattened so one reply
/// never turns into several IRC commands.
pub fn privmsg(channel: &str, text: &str) -> String {
    let text: String = text
        .chars()
        .map(|c| if c == '\r' || c == '\n' { ' ' } else { c })
        .collect();
    format!(
        "PRIVMSG #{} :{}",
        channel.trim_start_matches('#').to_lowercase(),
        text
    )
}

pub fn pong(param: &str) -> String {
    format!("PONG :{}", param)
}
