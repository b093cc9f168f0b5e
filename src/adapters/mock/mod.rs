//! Mock implementations for testing.
//!
//! # Available Mocks
//!
//! - [`InMemorySecrets`] - secret slots held in memory
//! - [`RecordingSink`] - reply sink that records what it was asked to send
//! - [`CapturingPrompt`] - authorization prompt that hands URLs to the test

pub mod prompt;
pub mod reply;
pub mod secrets;

pub use prompt::{state_from_url, CapturingPrompt};
pub use reply::RecordingSink;
pub use secrets::InMemorySecrets;
