//! streambot - a streaming-platform companion bot
//!
//! This library exposes modules for use in integration tests.

pub mod adapters;
pub mod app;
pub mod auth;
pub mod cli;
pub mod commands;
pub mod error;
pub mod models;
pub mod server;
pub mod startup;
pub mod state;
pub mod stats;
pub mod storage;
pub mod traits;
pub mod transport;
