//! Credential lifecycle: validate, refresh, or fall back to the browser.
//!
//! [`CredentialManager`] is the only owner of the bot's token pair. It is
//! consulted once at startup through [`CredentialManager::acquire`] and,
//! afterwards, by the chat transport through the [`TokenSource`] seam when
//! the server rejects a login.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use super::callback::AuthCallbackSlot;
use super::credentials::{AppCredentials, Credentials};
use super::flow::{AuthSettings, InteractiveFlow};
use super::platform_api::{PlatformAuthClient, TokenResponse, ValidateResponse};
use crate::error::AuthFailure;
use crate::traits::{AuthorizationPrompt, SecretStore, TokenSource};

/// The three stages of acquisition, tried in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AcquireStep {
    Validate,
    Refresh,
    Interactive,
}

/// Owns the access/refresh token pair for the bot identity.
pub struct CredentialManager {
    secrets: Arc<dyn SecretStore>,
    api: PlatformAuthClient,
    app: AppCredentials,
    settings: AuthSettings,
    callbacks: AuthCallbackSlot,
    prompt: Arc<dyn AuthorizationPrompt>,
    /// Last token handed out.
    current: RwLock<Option<String>>,
    /// Serializes acquisition so two renewals never race on the slots.
    acquiring: Mutex<()>,
}

impl CredentialManager {
    pub fn new(
        secrets: Arc<dyn SecretStore>,
        api: PlatformAuthClient,
        app: AppCredentials,
        settings: AuthSettings,
        callbacks: AuthCallbackSlot,
        prompt: Arc<dyn AuthorizationPrompt>,
    ) -> Self {
        Self {
            secrets,
            api,
            app,
            settings,
            callbacks,
            prompt,
            current: RwLock::new(None),
            acquiring: Mutex::new(()),
        }
    }

    /// Produce a usable access token.
    ///
    /// Runs Validate, then Refresh, then the interactive flow. Any error
    /// returned here is fatal for the caller; there is no retry beyond the
    /// three stages.
    pub async fn acquire(&self) -> Result<String, AuthFailure> {
        self.run_steps(true).await
    }

    /// Validate `token` and return who it belongs to.
    pub async fn identify(&self, token: &str) -> Result<ValidateResponse, AuthFailure> {
        Ok(self.api.validate_token(token).await?)
    }

    async fn run_steps(&self, allow_interactive: bool) -> Result<String, AuthFailure> {
        let _guard = self.acquiring.lock().await;

        let mut creds = Credentials::load(self.secrets.as_ref()).await?;
        let mut step = if creds.has_access_token() {
            AcquireStep::Validate
        } else {
            AcquireStep::Interactive
        };

        loop {
            debug!("Credential acquisition step: {:?}", step);
            step = match step {
                AcquireStep::Validate => match self.api.validate_token(&creds.access_token).await {
                    Ok(identity) => {
                        info!("Stored access token is valid for {}", identity.login);
                        return Ok(self.remember(creds.access_token).await);
                    }
                    Err(e) => {
                        warn!("Stored access token failed validation: {}", e);
                        creds.expired = true;
                        if creds.has_refresh_token() {
                            AcquireStep::Refresh
                        } else {
                            AcquireStep::Interactive
                        }
                    }
                },
                AcquireStep::Refresh => match self
                    .api
                    .refresh_token(
                        &self.app.client_id,
                        &self.app.client_secret,
                        &creds.refresh_token,
                    )
                    .await
                {
                    Ok(tokens) => {
                        info!("Access token refreshed");
                        return Ok(self.store(tokens).await);
                    }
                    Err(e) => {
                        warn!("Token refresh failed: {}", e);
                        AcquireStep::Interactive
                    }
                },
                AcquireStep::Interactive => {
                    if !allow_interactive {
                        return Err(AuthFailure::RenewalUnavailable);
                    }
                    let flow = InteractiveFlow {
                        api: &self.api,
                        app: &self.app,
                        settings: &self.settings,
                        callbacks: &self.callbacks,
                        prompt: self.prompt.as_ref(),
                    };
                    let tokens = flow.run().await?;
                    return Ok(self.store(tokens).await);
                }
            };
        }
    }

    /// Persist a freshly issued pair. A failed write is logged; the new
    /// token is returned regardless.
    async fn store(&self, tokens: TokenResponse) -> String {
        let creds = Credentials::new(tokens.access_token, tokens.refresh_token);
        if let Err(e) = creds.save(self.secrets.as_ref()).await {
            warn!("Failed to persist new credentials: {}", e);
        }
        self.remember(creds.access_token).await
    }

    async fn remember(&self, token: String) -> String {
        *self.current.write().await = Some(token.clone());
        token
    }
}

#[async_trait]
impl TokenSource for CredentialManager {
    async fn current_token(&self) -> Option<String> {
        self.current.read().await.clone()
    }

    async fn renew_token(&self) -> Result<String, AuthFailure> {
        self.run_steps(false).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::{CapturingPrompt, InMemorySecrets};

    fn manager_with(secrets: Arc<InMemorySecrets>) -> CredentialManager {
        CredentialManager::new(
            secrets,
            // Nothing listens here; every platform call fails fast.
            PlatformAuthClient::with_base_url("http://127.0.0.1:1".to_string()),
            AppCredentials {
                client_id: "cid".to_string(),
                client_secret: "secret".to_string(),
            },
            AuthSettings::new("http://localhost:51145/twitch_auth"),
            AuthCallbackSlot::new(),
            Arc::new(CapturingPrompt::new()),
        )
    }

    #[tokio::test]
    async fn test_no_token_cached_before_acquire() {
        let manager = manager_with(Arc::new(InMemorySecrets::new()));
        assert!(manager.current_token().await.is_none());
    }

    #[tokio::test]
    async fn test_renew_without_tokens_is_unavailable() {
        let manager = manager_with(Arc::new(InMemorySecrets::new()));
        let result = manager.renew_token().await;
        assert!(matches!(result, Err(AuthFailure::RenewalUnavailable)));
    }

    #[tokio::test]
    async fn test_secret_store_failure_surfaces() {
        let secrets = Arc::new(InMemorySecrets::new());
        secrets.set_fail_reads(true);
        let manager = manager_with(secrets);
        let result = manager.acquire().await;
        assert!(matches!(result, Err(AuthFailure::SecretStore(_))));
    }
}
