//! Interactive authorization-code flow.
//!
//! Reached only when neither the stored access token nor the refresh token
//! produced a usable credential. Blocks the calling task (not a thread)
//! until the web callback listener delivers the redirect.

use tracing::{info, warn};

use super::callback::{AuthCallback, AuthCallbackSlot};
use super::credentials::AppCredentials;
use super::platform_api::{PlatformApiError, PlatformAuthClient, TokenResponse};
use super::state::{generate_state, states_match};
use crate::error::AuthFailure;
use crate::traits::AuthorizationPrompt;

/// Scopes requested from the platform.
pub const DEFAULT_SCOPES: &[&str] = &[
    "analytics:read:extensions",
    "analytics:read:games",
    "bits:read",
    "channel:edit:commercial",
    "channel:manage:broadcast",
    "channel:moderate",
    "channel:read:hype_train",
    "channel:read:redemptions",
    "channel:read:stream_key",
    "channel:read:subscriptions",
    "chat:edit",
    "chat:read",
    "clips:edit",
    "user:edit",
    "user:edit:follows",
    "user:read:broadcast",
    "user:read:email",
    "whispers:edit",
    "whispers:read",
    "channel_read",
    "user_follows_edit",
    "channel_editor",
    "channel_commercial",
    "channel_subscriptions",
];

/// Where the platform sends the operator back to, and what we ask for.
#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub redirect_uri: String,
    pub scopes: Vec<String>,
}

impl AuthSettings {
    pub fn new(redirect_uri: impl Into<String>) -> Self {
        Self {
            redirect_uri: redirect_uri.into(),
            scopes: DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// The transient handshake state: the `state` we generated, waiting for the
/// redirect that echoes it. Consumed by [`PendingExchange::accept`].
#[derive(Debug)]
pub struct PendingExchange {
    expected_state: String,
}

impl PendingExchange {
    /// Start a handshake with a freshly generated state.
    pub fn begin() -> Self {
        Self::with_state(generate_state())
    }

    pub fn with_state(expected_state: impl Into<String>) -> Self {
        Self {
            expected_state: expected_state.into(),
        }
    }

    pub fn state(&self) -> &str {
        &self.expected_state
    }

    /// Check the redirect and release the authorization code.
    ///
    /// The state check comes first: a forged callback is rejected even when
    /// it also carries an error.
    pub fn accept(self, callback: AuthCallback) -> Result<String, AuthFailure> {
        if !states_match(&self.expected_state, &callback.state) {
            return Err(AuthFailure::InvalidState);
        }
        if let Some(error) = callback.error {
            return Err(AuthFailure::Denied(error));
        }
        if callback.code.is_empty() {
            return Err(AuthFailure::Denied("no authorization code returned".to_string()));
        }
        Ok(callback.code)
    }
}

/// One run of the browser-based handshake.
pub struct InteractiveFlow<'a> {
    pub api: &'a PlatformAuthClient,
    pub app: &'a AppCredentials,
    pub settings: &'a AuthSettings,
    pub callbacks: &'a AuthCallbackSlot,
    pub prompt: &'a dyn AuthorizationPrompt,
}

impl InteractiveFlow<'_> {
    /// Present the authorization URL, wait for the redirect, verify its
    /// state and exchange the code.
    pub async fn run(&self) -> Result<TokenResponse, AuthFailure> {
        let pending = PendingExchange::begin();
        let scopes: Vec<&str> = self.settings.scopes.iter().map(String::as_str).collect();
        let url = self.api.authorize_url(
            &self.app.client_id,
            &self.settings.redirect_uri,
            &scopes,
            pending.state(),
        );

        let receiver = self.callbacks.arm();
        self.prompt.present(&url);
        info!("Waiting for authorization callback on {}", self.settings.redirect_uri);

        let callback = receiver.await.map_err(|_| AuthFailure::CallbackAbandoned)?;

        let code = pending.accept(callback).inspect_err(|e| {
            warn!("Authorization callback rejected: {}", e);
        })?;

        match self
            .api
            .exchange_code(
                &self.app.client_id,
                &self.app.client_secret,
                &code,
                &self.settings.redirect_uri,
            )
            .await
        {
            Ok(tokens) => {
                info!("Authorization code exchanged");
                Ok(tokens)
            }
            Err(PlatformApiError::ServerError { status, message }) => {
                Err(AuthFailure::ExchangeRejected {
                    status,
                    body: message,
                })
            }
            Err(e) => Err(AuthFailure::Platform(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accept_matching_state_returns_code() {
        let pending = PendingExchange::with_state("expected");
        let code = pending
            .accept(AuthCallback::code("auth-code", "expected"))
            .unwrap();
        assert_eq!(code, "auth-code");
    }

    #[test]
    fn test_accept_mismatched_state_is_invalid_state() {
        let pending = PendingExchange::with_state("expected");
        let result = pending.accept(AuthCallback::code("auth-code", "forged"));
        assert!(matches!(result, Err(AuthFailure::InvalidState)));
    }

    #[test]
    fn test_state_check_precedes_error() {
        let pending = PendingExchange::with_state("expected");
        let callback = AuthCallback {
            code: String::new(),
            state: "forged".to_string(),
            error: Some("access_denied".to_string()),
        };
        assert!(matches!(
            pending.accept(callback),
            Err(AuthFailure::InvalidState)
        ));
    }

    #[test]
    fn test_accept_denied_callback() {
        let pending = PendingExchange::with_state("expected");
        let callback = AuthCallback {
            code: String::new(),
            state: "expected".to_string(),
            error: Some("access_denied".to_string()),
        };
        match pending.accept(callback) {
            Err(AuthFailure::Denied(reason)) => assert_eq!(reason, "access_denied"),
            other => panic!("expected Denied, got {:?}", other),
        }
    }

    #[test]
    fn test_accept_empty_code_is_denied() {
        let pending = PendingExchange::with_state("expected");
        let result = pending.accept(AuthCallback::code("", "expected"));
        assert!(matches!(result, Err(AuthFailure::Denied(_))));
    }

    #[test]
    fn test_begin_generates_fresh_state() {
        let a = PendingExchange::begin();
        let b = PendingExchange::begin();
        assert_ne!(a.state(), b.state());
        assert!(!a.state().is_empty());
    }

    #[test]
    fn test_default_settings_request_chat_scopes() {
        let settings = AuthSettings::new("http://localhost:51145/twitch_auth");
        assert!(settings.scopes.iter().any(|s| s == "chat:read"));
        assert!(settings.scopes.iter().any(|s| s == "chat:edit"));
        assert!(settings.scopes.iter().any(|s| s == "channel:read:redemptions"));
    }
}
