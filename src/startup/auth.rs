//! Credential acquisition at startup.
//!
//! Reads the platform application secrets, builds the
//! [`CredentialManager`] and runs acquisition once. Any failure here is
//! fatal: the bot never starts its transports without a token.

use std::sync::Arc;

use tracing::{info, warn};

use super::config::BotConfig;
use crate::auth::{
    AppCredentials, AuthCallbackSlot, AuthSettings, CredentialManager, PlatformAuthClient,
    ValidateResponse,
};
use crate::error::AuthFailure;
use crate::traits::{AuthorizationPrompt, SecretStore};

/// Outcome of a successful sign-in.
#[derive(Debug, Clone)]
pub struct SignedIn {
    pub token: String,
    pub identity: ValidateResponse,
}

/// Build the credential manager from configuration and stored app secrets.
pub async fn build_credential_manager(
    config: &BotConfig,
    secrets: Arc<dyn SecretStore>,
    callbacks: AuthCallbackSlot,
    prompt: Arc<dyn AuthorizationPrompt>,
) -> Result<CredentialManager, AuthFailure> {
    let app = AppCredentials::load(secrets.as_ref()).await?;
    if app.client_id.is_empty() {
        warn!("No platform client id stored; sign-in will fail");
    }

    Ok(CredentialManager::new(
        secrets,
        PlatformAuthClient::with_base_url(config.auth_url.clone()),
        app,
        AuthSettings::new(config.redirect_uri.clone()),
        callbacks,
        prompt,
    ))
}

/// Acquire a token and resolve the identity it belongs to.
pub async fn sign_in(manager: &CredentialManager) -> Result<SignedIn, AuthFailure> {
    let token = manager.acquire().await?;
    let identity = manager.identify(&token).await?;
    info!("Logged in and authenticated as {}", identity.login);
    Ok(SignedIn { token, identity })
}
