//! Integration tests for the command router running as a task.
//!
//! Events are pushed through the shared channel the transports use; the
//! recording sinks stand in for the primary and companion chats.

mod common;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use common::RouterHarness;
use streambot::app::shutdown_channel;
use streambot::models::{BotEvent, InboundCommand, Transport};
use streambot::state::{AccessControlList, CounterStore};
use streambot::transport::twitch_chat::OUTGOING_CAPACITY;
use streambot::transport::PrimaryChatSink;

fn primary(text: &str, caller: &str) -> BotEvent {
    BotEvent::Command(InboundCommand::new(Transport::PrimaryChat, text, caller))
}

fn companion(text: &str, caller: &str, channel: &str) -> BotEvent {
    BotEvent::Command(InboundCommand::new(Transport::CompanionChat, text, caller).in_channel(channel))
}

/// Feed `events` to a running router loop, then shut it down.
async fn run_events(harness: &RouterHarness, events: Vec<BotEvent>) {
    let (tx, rx) = mpsc::channel(16);
    let (trigger, shutdown) = shutdown_channel();
    let task = tokio::spawn(harness.router_loop().run(rx, shutdown));

    for event in events {
        tx.send(event).await.unwrap();
    }
    drop(tx);

    // Closing the channel ends the loop once everything is handled.
    tokio::time::timeout(Duration::from_secs(2), task)
        .await
        .expect("router did not stop")
        .unwrap();
    trigger.trigger();
}

#[tokio::test]
async fn test_commands_are_answered_in_order() {
    let harness = RouterHarness::new();
    harness.acl.add(Transport::PrimaryChat, "mod-1");

    run_events(
        &harness,
        vec![
            primary("!counter deaths 1", "mod-1"),
            primary("!counter deaths 1", "mod-1"),
            primary("!counter deaths -3", "mod-1"),
        ],
    )
    .await;

    assert_eq!(
        harness.primary.texts(),
        vec!["deaths: 1", "deaths: 2", "deaths: -1"]
    );
}

#[tokio::test]
async fn test_unprivileged_counter_is_silent_and_unchanged() {
    let harness = RouterHarness::new();
    run_events(&harness, vec![primary("!counter deaths 5", "viewer")]).await;

    assert!(harness.primary.sent().is_empty());
    assert!(!harness.counters.exists("deaths"));
}

#[tokio::test]
async fn test_granted_access_is_per_transport() {
    let harness = RouterHarness::new();
    harness.acl.add(Transport::PrimaryChat, "owner");

    run_events(
        &harness,
        vec![
            primary("!access add discord 555", "owner"),
            companion("!counter hype 2", "555", "chan-9"),
            companion("!counter hype 2", "777", "chan-9"),
        ],
    )
    .await;

    assert_eq!(harness.primary.texts(), vec!["555 now has access on discord"]);
    assert_eq!(
        harness.companion.sent(),
        vec![(Some("chan-9".to_string()), "hype: 2".to_string())]
    );
    assert!(!harness.acl.check(Transport::PrimaryChat, "555"));
}

#[tokio::test]
async fn test_companion_reply_uses_command_channel() {
    let harness = RouterHarness::new();
    run_events(
        &harness,
        vec![
            companion("!discord", "1", "chan-a"),
            companion("!commands", "2", "chan-b"),
        ],
    )
    .await;

    let sent = harness.companion.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].0.as_deref(), Some("chan-a"));
    assert!(sent[0].1.ends_with("https://discord.gg/6fP8vWW"));
    assert_eq!(sent[1], (Some("chan-b".to_string()), "!discord, !commands (this command)".to_string()));
}

#[tokio::test]
async fn test_announcements_reach_primary_chat() {
    let harness = RouterHarness::new();
    run_events(
        &harness,
        vec![BotEvent::Announce {
            transport: Transport::PrimaryChat,
            text: "I completed 'Hydrate' redeemed by @Viewer!".to_string(),
            channel: None,
        }],
    )
    .await;

    assert_eq!(
        harness.primary.texts(),
        vec!["I completed 'Hydrate' redeemed by @Viewer!"]
    );
}

#[tokio::test]
async fn test_state_survives_reload() {
    let harness = RouterHarness::new();
    harness.acl.add(Transport::CompanionChat, "42");

    run_events(
        &harness,
        vec![
            companion("!counter wins 3", "42", "c"),
            companion("!access add twitch 99", "42", "c"),
            companion("!access remove discord 42", "42", "c"),
        ],
    )
    .await;

    let acl = AccessControlList::load(harness.store()).unwrap();
    let counters = CounterStore::load(harness.store()).unwrap();
    assert!(acl.check(Transport::PrimaryChat, "99"));
    assert!(!acl.check(Transport::CompanionChat, "42"));
    assert_eq!(counters.get("wins"), Some(3));
}

#[tokio::test]
async fn test_shutdown_stops_idle_router() {
    let harness = RouterHarness::new();
    let (_tx, rx) = mpsc::channel::<BotEvent>(4);
    let (trigger, shutdown) = shutdown_channel();
    let task = tokio::spawn(harness.router_loop().run(rx, shutdown));

    trigger.trigger();
    tokio::time::timeout(Duration::from_secs(2), task)
        .await
        .expect("router ignored shutdown")
        .unwrap();
}

#[tokio::test]
async fn test_stalled_primary_chat_does_not_block_companion() {
    let harness = RouterHarness::new();
    // Nobody drains the primary queue, as while the chat client reconnects.
    let (chat_sink, _queue) = PrimaryChatSink::channel();
    let (tx, rx) = mpsc::channel(OUTGOING_CAPACITY + 8);
    let (trigger, shutdown) = shutdown_channel();
    let task = tokio::spawn(
        harness
            .router_loop_with_primary(Arc::new(chat_sink))
            .run(rx, shutdown),
    );

    for _ in 0..OUTGOING_CAPACITY + 2 {
        tx.send(primary("!discord", "viewer")).await.unwrap();
    }
    tx.send(companion("!discord", "1", "chan-a")).await.unwrap();
    drop(tx);

    tokio::time::timeout(Duration::from_secs(2), task)
        .await
        .expect("router stalled on a full primary queue")
        .unwrap();
    trigger.trigger();

    let sent = harness.companion.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0.as_deref(), Some("chan-a"));
}
