//! Command handlers.
//!
//! Each handler returns the reply text, or `None` for no reply. Bad input
//! is answered in chat; nothing here fails the process.

use std::sync::Arc;

use tracing::info;

use super::parse::BotCommand;
use crate::models::Transport;
use crate::state::{AccessControlList, CounterStore};

/// What the handlers need from the rest of the bot.
pub struct HandlerContext {
    pub prefix: char,
    pub invite_link: String,
    pub acl: Arc<AccessControlList>,
    pub counters: Arc<CounterStore>,
}

impl HandlerContext {
    pub fn handle(&self, command: BotCommand, args: &[&str], is_privileged: bool) -> Option<String> {
        match command {
            BotCommand::Discord => Some(self.discord()),
            BotCommand::Commands => Some(self.commands(is_privileged)),
            BotCommand::Access => self.access(args),
            BotCommand::Counter => Some(self.counter(args)),
        }
    }

    fn discord(&self) -> String {
        format!(
            "You can join my discord by clicking this link: {}",
            self.invite_link
        )
    }

    fn commands(&self, is_privileged: bool) -> String {
        BotCommand::all()
            .into_iter()
            .filter(|cmd| is_privileged || !cmd.requires_privilege())
            .map(|cmd| match cmd {
                BotCommand::Commands => format!("{}{} (this command)", self.prefix, cmd.name()),
                _ => format!("{}{}", self.prefix, cmd.name()),
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// `access <add|remove> <transport> <identity>`
    fn access(&self, args: &[&str]) -> Option<String> {
        let [verb, transport, identity, ..] = args else {
            return Some(format!(
                "Usage: {}access <add|remove> <twitch|discord> <identity>",
                self.prefix
            ));
        };
        let transport = Transport::from_command_arg(transport);

        match *verb {
            "add" => {
                self.acl.add(transport, identity);
                info!("Granted access to {} on {}", identity, transport);
                Some(format!("{} now has access on {}", identity, transport))
            }
            "remove" => {
                self.acl.remove(transport, identity);
                info!("Revoked access from {} on {}", identity, transport);
                Some(format!("{} no longer has access on {}", identity, transport))
            }
            _ => None,
        }
    }

    /// `counter <name> [delta]`
    fn counter(&self, args: &[&str]) -> String {
        match args {
            [] => format!("Usage: {}counter <name> [delta]", self.prefix),
            [name] => format!("{}: {}", name, self.counters.apply(name, 0)),
            [name, delta, ..] => match delta.parse::<i64>() {
                Ok(delta) => format!("{}: {}", name, self.counters.apply(name, delta)),
                Err(_) => format!("{}: {} is not a number", name, delta),
            },
        }
    }
}
