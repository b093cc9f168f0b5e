//! Credential acquisition failures.

use thiserror::Error;

use super::SecretStoreError;
use crate::auth::platform_api::PlatformApiError;

/// Reasons a credential could not be produced.
///
/// Every variant terminates the acquisition attempt. At startup the caller
/// treats any of them as fatal.
#[derive(Debug, Error)]
pub enum AuthFailure {
    /// The state echoed by the callback differs from the one we generated.
    #[error("authorization state mismatch, refusing to exchange the code")]
    InvalidState,

    /// The platform refused the authorization-code exchange.
    #[error("token exchange rejected ({status}): {body}")]
    ExchangeRejected { status: u16, body: String },

    /// The operator declined consent on the platform's authorization page.
    #[error("authorization denied: {0}")]
    Denied(String),

    /// The callback slot was dropped before any code arrived.
    #[error("authorization callback abandoned before a code arrived")]
    CallbackAbandoned,

    /// Non-interactive renewal was requested but neither the stored token
    /// nor the refresh token is usable.
    #[error("stored credentials cannot be renewed without operator interaction")]
    RenewalUnavailable,

    /// The secret store could not be read.
    #[error("secret store error: {0}")]
    SecretStore(#[from] SecretStoreError),

    /// Transport-level failure talking to the platform.
    #[error("platform request failed: {0}")]
    Platform(#[from] PlatformApiError),
}

impl AuthFailure {
    /// Short operator-facing hint printed next to the error on startup.
    pub fn operator_hint(&self) -> &'static str {
        match self {
            AuthFailure::InvalidState => {
                "The callback did not come from the authorization request we opened. Restart and try again."
            }
            AuthFailure::ExchangeRejected { .. } => {
                "Check that the client id, secret and redirect URI registered with the platform match."
            }
            AuthFailure::Denied(_) => "Approve the requested scopes to let the bot sign in.",
            AuthFailure::CallbackAbandoned => "The callback listener stopped before sign-in finished.",
            AuthFailure::RenewalUnavailable => "Restart the bot to sign in interactively.",
            AuthFailure::SecretStore(_) => "Check the secret store URL and client certificate.",
            AuthFailure::Platform(_) => "Check network connectivity to the platform.",
        }
    }
}
