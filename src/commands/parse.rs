//! Chat command definitions and parsing.

/// Every command the bot answers to.
///
/// Names are matched exactly (case-sensitive) after the prefix is stripped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotCommand {
    /// Post the companion-chat invite link.
    /// Primary: discord
    Discord,

    /// List the commands the caller may use.
    /// Primary: commands
    Commands,

    /// Grant or revoke privileges.
    /// Primary: access
    Access,

    /// Read or adjust a named counter.
    /// Primary: counter
    Counter,
}

impl BotCommand {
    /// All commands, in the order they are listed to users.
    pub fn all() -> Vec<Self> {
        vec![
            BotCommand::Discord,
            BotCommand::Commands,
            BotCommand::Access,
            BotCommand::Counter,
        ]
    }

    /// Look up a command by name, without the prefix.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "discord" => Some(BotCommand::Discord),
            "commands" => Some(BotCommand::Commands),
            "access" => Some(BotCommand::Access),
            "counter" => Some(BotCommand::Counter),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            BotCommand::Discord => "discord",
            BotCommand::Commands => "commands",
            BotCommand::Access => "access",
            BotCommand::Counter => "counter",
        }
    }

    /// Privileged commands are silently ignored for everyone else.
    pub fn requires_privilege(&self) -> bool {
        matches!(self, BotCommand::Access | BotCommand::Counter)
    }
}

/// A prefixed chat line split into command name and arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand<'a> {
    pub name: &'a str,
    pub args: Vec<&'a str>,
}

/// Split `text` into a command and its arguments.
///
/// Returns `None` when the text does not start with `prefix` or nothing
/// follows the prefix. Runs of whitespace never produce empty arguments.
pub fn parse_command(prefix: char, text: &str) -> Option<ParsedCommand<'_>> {
    let rest = text.strip_prefix(prefix)?;
    let mut tokens = rest.split_whitespace();
    // "! counter" has no command token glued to the prefix.
    if rest.starts_with(char::is_whitespace) {
        return None;
    }
    let name = tokens.next()?;
    Some(ParsedCommand {
        name,
        args: tokens.collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command_and_args() {
        let parsed = parse_command('!', "!counter hype 5").unwrap();
        assert_eq!(parsed.name, "counter");
        assert_eq!(parsed.args, vec!["hype", "5"]);
    }

    #[test]
    fn test_repeated_spaces_are_collapsed() {
        let parsed = parse_command('!', "!access   add  twitch   12345 ").unwrap();
        assert_eq!(parsed.name, "access");
        assert_eq!(parsed.args, vec!["add", "twitch", "12345"]);
    }

    #[test]
    fn test_missing_prefix_is_not_a_command() {
        assert!(parse_command('!', "counter hype 5").is_none());
        assert!(parse_command('!', " !counter").is_none());
        assert!(parse_command('!', "").is_none());
    }

    #[test]
    fn test_bare_prefix_is_not_a_command() {
        assert!(parse_command('!', "!").is_none());
        assert!(parse_command('!', "! counter").is_none());
    }

    #[test]
    fn test_custom_prefix() {
        let parsed = parse_command('?', "?discord").unwrap();
        assert_eq!(parsed.name, "discord");
        assert!(parsed.args.is_empty());
        assert!(parse_command('?', "!discord").is_none());
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        assert_eq!(BotCommand::from_name("counter"), Some(BotCommand::Counter));
        assert_eq!(BotCommand::from_name("Counter"), None);
        assert_eq!(BotCommand::from_name("unknown"), None);
    }

    #[test]
    fn test_names_round_trip() {
        for cmd in BotCommand::all() {
            assert_eq!(BotCommand::from_name(cmd.name()), Some(cmd));
        }
    }

    #[test]
    fn test_privileged_commands() {
        assert!(!BotCommand::Discord.requires_privilege());
        assert!(!BotCommand::Commands.requires_privilege());
        assert!(BotCommand::Access.requires_privilege());
        assert!(BotCommand::Counter.requires_privilege());
    }
}
