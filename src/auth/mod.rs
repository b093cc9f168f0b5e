//! Credential lifecycle for the bot identity.
//!
//! - Credential record and secret slots
//! - Platform identity API client (validate, refresh, code exchange)
//! - CSRF state generation and the callback rendezvous
//! - Interactive authorization-code flow
//! - [`CredentialManager`], the Validate -> Refresh -> Interactive machine

pub mod callback;
pub mod credentials;
pub mod flow;
pub mod manager;
pub mod platform_api;
pub mod state;

pub use callback::{AuthCallback, AuthCallbackSlot};
pub use credentials::{AppCredentials, Credentials};
pub use flow::{AuthSettings, InteractiveFlow, PendingExchange, DEFAULT_SCOPES};
pub use manager::CredentialManager;
pub use platform_api::{PlatformApiError, PlatformAuthClient, TokenResponse, ValidateResponse};
pub use state::{generate_state, states_match};
