//! Apex Legends telemetry accumulator.
//!
//! Fed with the `data` part of companion-app messages. Counts deaths, kills
//! and friends for the session and renders them as an overlay text file,
//! rewritten only when the text actually changes.

use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use color_eyre::{eyre::WrapErr, Result};
use serde_json::Value;
use tracing::debug;

/// Info features that carry no stats.
const IGNORED_FEATURES: &[&str] = &["location"];

/// Kill-feed actions that count as a kill for the local player.
const KILL_ACTIONS: &[&str] = &["kill", "Bleed Out"];

#[derive(Debug, Clone, PartialEq)]
pub struct ApexStats {
    pub local_player_name: Option<String>,
    pub deaths: u32,
    pub knocked_out: u32,
    pub assists: u32,
    pub knockdowns: u32,
    pub kills: u32,
    pub squad_kills: i64,
    pub damage_dealt: f64,
    pub headshots: u32,
    pub wins: u32,
    pub losses: u32,
    pub currently_alive: bool,
}

impl Default for ApexStats {
    fn default() -> Self {
        Self {
            local_player_name: None,
            deaths: 0,
            knocked_out: 0,
            assists: 0,
            knockdowns: 0,
            kills: 0,
            squad_kills: 0,
            damage_dealt: 0.0,
            headshots: 0,
            wins: 0,
            losses: 0,
            currently_alive: true,
        }
    }
}

/// Event payloads arrive either as objects or as JSON encoded in a string.
fn decode_embedded(value: &Value) -> Value {
    match value {
        Value::String(s) => serde_json::from_str(s).unwrap_or(Value::Null),
        other => other.clone(),
    }
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Counters saturate instead of wrapping.
fn bump(counter: &mut u32) {
    *counter = counter.saturating_add(1);
}

fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

impl ApexStats {
    /// Apply one telemetry update.
    ///
    /// Updates with a (non-ignored) `feature` are info updates; anything
    /// else is scanned for an `events` array.
    pub fn apply(&mut self, item: &Value) {
        match item["feature"].as_str() {
            Some(feature) if !IGNORED_FEATURES.contains(&feature) => {
                self.apply_info(feature, &item["info"]["match_info"])
            }
            _ => {
                if let Some(events) = item["events"].as_array() {
                    for event in events {
                        self.apply_event(event);
                    }
                }
            }
        }
    }

    fn apply_info(&mut self, feature: &str, match_info: &Value) {
        match feature {
            "rank" => match as_bool(&match_info["victory"]) {
                Some(true) => bump(&mut self.wins),
                Some(false) => bump(&mut self.losses),
                None => {}
            },
            "match_summary" => {
                let summary = decode_embedded(&match_info["match_summary"]);
                if let Some(kills) = as_i64(&summary["squadKills"]) {
                    self.squad_kills = self.squad_kills.saturating_add(kills);
                }
            }
            other => debug!("Unhandled Apex info feature {}", other),
        }
    }

    fn apply_event(&mut self, event: &Value) {
        let Some(name) = event["name"].as_str() else {
            return;
        };
        let data = decode_embedded(&event["data"]);

        match name {
            "match_start" | "respawn" | "healed_from_ko" => self.currently_alive = true,
            "match_end" => self.currently_alive = false,
            "death" => {
                bump(&mut self.deaths);
                self.currently_alive = false;
            }
            "knocked_out" => bump(&mut self.knocked_out),
            "kill" => bump(&mut self.kills),
            "knockdown" => bump(&mut self.knockdowns),
            "assist" => bump(&mut self.assists),
            "damage" => {
                if self.currently_alive {
                    self.damage_dealt += as_f64(&data["damageAmount"]).unwrap_or(0.0);
                    if as_bool(&data["headshot"]) == Some(true) {
                        bump(&mut self.headshots);
                    }
                }
            }
            "kill_feed" => {
                if let Some(local) = as_text(&data["local_player_name"]) {
                    self.local_player_name = Some(local);
                }
                let attacker = as_text(&data["attackerName"]);
                if attacker.is_some() && attacker == self.local_player_name {
                    let action = data["action"].as_str().unwrap_or_default();
                    if KILL_ACTIONS.contains(&action) {
                        bump(&mut self.kills);
                    }
                }
            }
            other => debug!("Unhandled Apex event {}", other),
        }
    }

    /// Overlay text.
    pub fn summary(&self) -> String {
        format!(
            "Times died:        {}\n\
             Times knocked out: {}\n\
             \n\
             Kills:             {}\n\
             Knockdowns:        {}\n\
             Assists:           {}\n\
             \n\
             Squad kills:       {}\n\
             \n\
             Damage dealt:      {}\n\
             Headshots:         {}\n\
             \n\
             Wins:              {}\n\
             Losses:            {}",
            self.deaths,
            self.knocked_out,
            self.kills,
            self.knockdowns,
            self.assists,
            self.squad_kills,
            self.damage_dealt,
            self.headshots,
            self.wins,
            self.losses,
        )
    }
}

struct TrackerState {
    stats: ApexStats,
    last_written: Option<String>,
}

/// Shared accumulator plus the overlay file it maintains.
pub struct ApexTracker {
    state: Mutex<TrackerState>,
    output: PathBuf,
}

impl ApexTracker {
    pub fn new(output: impl Into<PathBuf>) -> Self {
        Self {
            state: Mutex::new(TrackerState {
                stats: ApexStats::default(),
                last_written: None,
            }),
            output: output.into(),
        }
    }

    /// Write the initial (all zero) overlay.
    pub fn init(&self) -> Result<bool> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        self.write_if_changed(&mut state)
    }

    /// Apply one update. Returns whether the overlay file was rewritten.
    pub fn ingest(&self, item: &Value) -> Result<bool> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.stats.apply(item);
        self.write_if_changed(&mut state)
    }

    pub fn snapshot(&self) -> ApexStats {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .stats
            .clone()
    }

    fn write_if_changed(&self, state: &mut TrackerState) -> Result<bool> {
        let text = state.stats.summary();
        if state.last_written.as_deref() == Some(text.as_str()) {
            return Ok(false);
        }
        if let Some(parent) = self.output.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .wrap_err_with(|| format!("Failed to create {:?}", parent))?;
        }
        std::fs::write(&self.output, &text)
            .wrap_err_with(|| format!("Failed to write {:?}", self.output))?;
        state.last_written = Some(text);
        Ok(true)
    }
}
