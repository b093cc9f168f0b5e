//! Trait seams for dependency injection and testability.
//!
//! # Traits
//!
//! - [`SecretStore`] - durable named secrets (credential slots, app secrets)
//! - [`ReplySink`] - outbound reply delivery for one transport
//! - [`TokenSource`] - hands the chat transport a usable access token
//! - [`AuthorizationPrompt`] - presents the sign-in URL to the operator

pub mod prompt;
pub mod reply;
pub mod secrets;
pub mod token;

pub use prompt::AuthorizationPrompt;
pub use reply::ReplySink;
pub use secrets::SecretStore;
pub use token::TokenSource;
