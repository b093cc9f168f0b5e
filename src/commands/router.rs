//! Command Router: authorization, dispatch and reply routing.
//!
//! Transports push [`BotEvent`]s into one channel; [`RouterLoop`] consumes
//! them one at a time, so commands from a single transport are handled in
//! arrival order.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::handlers::HandlerContext;
use super::parse::{parse_command, BotCommand};
use crate::app::Shutdown;
use crate::error::TransportError;
use crate::models::{BotEvent, InboundCommand, Transport};
use crate::state::{AccessControlList, CounterStore};
use crate::traits::ReplySink;

/// Stateless part of the router: parse, authorize, run the handler.
pub struct CommandRouter {
    handlers: HandlerContext,
}

impl CommandRouter {
    pub fn new(
        prefix: char,
        invite_link: impl Into<String>,
        acl: Arc<AccessControlList>,
        counters: Arc<CounterStore>,
    ) -> Self {
        Self {
            handlers: HandlerContext {
                prefix,
                invite_link: invite_link.into(),
                acl,
                counters,
            },
        }
    }

    /// Run one inbound line through the router and return the reply text.
    ///
    /// `None` covers non-commands, unknown commands and privileged commands
    /// from callers without privileges.
    pub fn dispatch(&self, cmd: &InboundCommand) -> Option<String> {
        let parsed = parse_command(self.handlers.prefix, &cmd.text)?;
        let Some(command) = BotCommand::from_name(parsed.name) else {
            debug!("Ignoring unknown command '{}'", parsed.name);
            return None;
        };

        let is_privileged = self.is_privileged(cmd);
        if command.requires_privilege() && !is_privileged {
            debug!(
                "Dropping {} from unprivileged {} caller {}",
                command.name(),
                cmd.transport,
                cmd.caller
            );
            return None;
        }

        self.handlers.handle(command, &parsed.args, is_privileged)
    }

    /// Owner/moderator flag from the transport, or an access-list entry.
    pub fn is_privileged(&self, cmd: &InboundCommand) -> bool {
        cmd.is_privileged || self.handlers.acl.check(cmd.transport, &cmd.caller)
    }
}

/// Outbound sinks, one per transport.
#[derive(Clone)]
pub struct ReplyRoutes {
    pub primary: Arc<dyn ReplySink>,
    pub companion: Option<Arc<dyn ReplySink>>,
}

impl ReplyRoutes {
    fn sink(&self, transport: Transport) -> Option<&Arc<dyn ReplySink>> {
        match transport {
            Transport::PrimaryChat => Some(&self.primary),
            Transport::CompanionChat => self.companion.as_ref(),
        }
    }
}

/// The router's processing loop and its one piece of routing context.
pub struct RouterLoop {
    router: CommandRouter,
    routes: ReplyRoutes,
    /// Channel of the last companion-chat command; used by one reply.
    last_companion_channel: Option<String>,
}

impl RouterLoop {
    pub fn new(router: CommandRouter, routes: ReplyRoutes) -> Self {
        Self {
            router,
            routes,
            last_companion_channel: None,
        }
    }

    /// Process a single event to completion.
    pub async fn handle(&mut self, event: BotEvent) {
        match event {
            BotEvent::Command(cmd) => {
                if cmd.transport == Transport::CompanionChat {
                    self.last_companion_channel = cmd.channel.clone();
                }
                if let Some(reply) = self.router.dispatch(&cmd) {
                    self.reply(cmd.transport, &reply).await;
                }
            }
            BotEvent::Announce {
                transport,
                text,
                channel,
            } => {
                self.send(transport, channel.as_deref(), &text).await;
            }
        }
    }

    /// Send a command reply back where the command came from.
    async fn reply(&mut self, transport: Transport, text: &str) {
        match transport {
            Transport::PrimaryChat => self.send(transport, None, text).await,
            Transport::CompanionChat => {
                // Consumed before sending so a failed send can't leak the
                // reference into a later reply.
                match self.last_companion_channel.take() {
                    Some(channel) => self.send(transport, Some(&channel), text).await,
                    None => warn!("Dropping reply: {}", TransportError::NoDestination),
                }
            }
        }
    }

    async fn send(&self, transport: Transport, channel: Option<&str>, text: &str) {
        let Some(sink) = self.routes.sink(transport) else {
            warn!("No {} connection; dropping reply", transport);
            return;
        };
        if let Err(e) = sink.send(channel, text).await {
            warn!("Failed to send reply on {}: {}", transport, e);
        }
    }

    /// Consume events until the channel closes or shutdown is signalled.
    pub async fn run(mut self, mut events: mpsc::Receiver<BotEvent>, mut shutdown: Shutdown) {
        info!("Command router started");
        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => self.handle(event).await,
                    None => break,
                },
                _ = shutdown.wait() => break,
            }
        }
        info!("Command router stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::RecordingSink;
    use crate::storage::BlobStore;
    use tempfile::TempDir;

    struct Harness {
        _dir: TempDir,
        acl: Arc<AccessControlList>,
        counters: Arc<CounterStore>,
        primary: RecordingSink,
        companion: RecordingSink,
        router_loop: RouterLoop,
    }

    fn harness() -> Harness {
        let dir = TempDir::new().unwrap();
        let store = BlobStore::new(dir.path());
        let acl = Arc::new(AccessControlList::load(store.clone()).unwrap());
        let counters = Arc::new(CounterStore::load(store).unwrap());
        let primary = RecordingSink::new();
        let companion = RecordingSink::new();
        let router = CommandRouter::new(
            '!',
            "https://discord.gg/example",
            acl.clone(),
            counters.clone(),
        );
        let routes = ReplyRoutes {
            primary: Arc::new(primary.clone()),
            companion: Some(Arc::new(companion.clone())),
        };
        Harness {
            _dir: dir,
            acl,
            counters,
            primary,
            companion,
            router_loop: RouterLoop::new(router, routes),
        }
    }

    fn twitch(text: &str, caller: &str) -> InboundCommand {
        InboundCommand::new(Transport::PrimaryChat, text, caller)
    }

    #[tokio::test]
    async fn test_unprivileged_counter_has_no_reply() {
        let mut h = harness();
        h.router_loop
            .handle(BotEvent::Command(twitch("!counter hype 5", "viewer")))
            .await;
        assert!(h.primary.sent().is_empty());
        assert!(!h.counters.exists("hype"));
    }

    #[tokio::test]
    async fn test_moderator_counter_accumulates() {
        let mut h = harness();
        let cmd = twitch("!counter hype 5", "mod").privileged(true);
        h.router_loop.handle(BotEvent::Command(cmd.clone())).await;
        h.router_loop.handle(BotEvent::Command(cmd)).await;
        assert_eq!(h.primary.texts(), vec!["hype: 5", "hype: 10"]);
    }

    #[tokio::test]
    async fn test_access_list_grants_privilege() {
        let mut h = harness();
        h.acl.add(Transport::PrimaryChat, "viewer");
        h.router_loop
            .handle(BotEvent::Command(twitch("!counter deaths 1", "viewer")))
            .await;
        assert_eq!(h.primary.texts(), vec!["deaths: 1"]);
    }

    #[tokio::test]
    async fn test_access_on_other_transport_does_not_grant() {
        let mut h = harness();
        h.acl.add(Transport::CompanionChat, "viewer");
        h.router_loop
            .handle(BotEvent::Command(twitch("!counter deaths 1", "viewer")))
            .await;
        assert!(h.primary.sent().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_command_and_plain_text_are_ignored() {
        let mut h = harness();
        for text in ["!dance", "hello chat", "!"] {
            h.router_loop
                .handle(BotEvent::Command(twitch(text, "mod").privileged(true)))
                .await;
        }
        assert!(h.primary.sent().is_empty());
    }

    #[tokio::test]
    async fn test_companion_reply_uses_channel_once() {
        let mut h = harness();
        let cmd = InboundCommand::new(Transport::CompanionChat, "!discord", "42").in_channel("chan-1");
        h.router_loop.handle(BotEvent::Command(cmd)).await;

        assert_eq!(h.companion.sent()[0].0.as_deref(), Some("chan-1"));
        assert!(h.router_loop.last_companion_channel.is_none());
        assert!(h.primary.sent().is_empty());
    }

    #[tokio::test]
    async fn test_companion_channel_cleared_even_when_send_fails() {
        let mut h = harness();
        h.companion.set_should_fail(true);
        let cmd = InboundCommand::new(Transport::CompanionChat, "!discord", "42").in_channel("chan-1");
        h.router_loop.handle(BotEvent::Command(cmd)).await;

        assert_eq!(h.companion.sent().len(), 1);
        assert!(h.router_loop.last_companion_channel.is_none());
    }

    #[tokio::test]
    async fn test_companion_reply_without_channel_is_dropped() {
        let mut h = harness();
        let cmd = InboundCommand::new(Transport::CompanionChat, "!discord", "42");
        h.router_loop.handle(BotEvent::Command(cmd)).await;
        assert!(h.companion.sent().is_empty());
    }

    #[tokio::test]
    async fn test_announce_goes_to_primary() {
        let mut h = harness();
        h.router_loop
            .handle(BotEvent::Announce {
                transport: Transport::PrimaryChat,
                text: "I completed 'Hydrate' redeemed by @Viewer!".to_string(),
                channel: None,
            })
            .await;
        assert_eq!(
            h.primary.texts(),
            vec!["I completed 'Hydrate' redeemed by @Viewer!"]
        );
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let h = harness();
        let (_tx, rx) = mpsc::channel(8);
        let (trigger, shutdown) = crate::app::shutdown_channel();
        let task = tokio::spawn(h.router_loop.run(rx, shutdown));
        trigger.trigger();
        tokio::time::timeout(std::time::Duration::from_secs(2), task)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_run_processes_events_in_order() {
        let h = harness();
        let primary = h.primary.clone();
        let (tx, rx) = mpsc::channel(8);
        let (_trigger, shutdown) = crate::app::shutdown_channel();
        let task = tokio::spawn(h.router_loop.run(rx, shutdown));

        for delta in ["1", "2", "3"] {
            let text = format!("!counter c {}", delta);
            tx.send(BotEvent::Command(twitch(&text, "mod").privileged(true)))
                .await
                .unwrap();
        }
        drop(tx);
        task.await.unwrap();

        assert_eq!(primary.texts(), vec!["c: 1", "c: 3", "c: 6"]);
    }
}
