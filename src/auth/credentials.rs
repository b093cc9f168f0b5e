//! Credential record and the named secret slots it lives in.
//!
//! The access and refresh tokens are persisted independently under two
//! slots of the [`SecretStore`]. Nothing outside the credential manager
//! holds a [`Credentials`] value.

use std::fmt;

use crate::error::SecretStoreError;
use crate::traits::SecretStore;

/// Secret slot holding the access token.
pub const ACCESS_TOKEN_SLOT: &str = "TwitchAccessToken";

/// Secret slot holding the refresh token.
pub const REFRESH_TOKEN_SLOT: &str = "TwitchRefreshToken";

/// Secret slot holding the platform application's client id.
pub const CLIENT_ID_SLOT: &str = "TwitchClientId";

/// Secret slot holding the platform application's client secret.
pub const CLIENT_SECRET_SLOT: &str = "TwitchSecret";

/// Access/refresh token pair for the bot identity.
///
/// Empty strings mean "absent", matching what the secret store returns for
/// a slot that was never written.
#[derive(Clone, Default, PartialEq)]
pub struct Credentials {
    /// OAuth access token.
    pub access_token: String,
    /// OAuth refresh token.
    pub refresh_token: String,
    /// Set once the platform has refused `access_token`.
    pub expired: bool,
}

impl Credentials {
    /// Create credentials from a freshly issued token pair.
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            expired: false,
        }
    }

    /// Check if an access token is present.
    pub fn has_access_token(&self) -> bool {
        !self.access_token.is_empty()
    }

    /// Check if a refresh token is present.
    pub fn has_refresh_token(&self) -> bool {
        !self.refresh_token.is_empty()
    }

    /// Load both slots from the secret store.
    pub async fn load(store: &dyn SecretStore) -> Result<Self, SecretStoreError> {
        let access_token = store.get_secret(ACCESS_TOKEN_SLOT).await?;
        let refresh_token = store.get_secret(REFRESH_TOKEN_SLOT).await?;
        Ok(Self::new(access_token, refresh_token))
    }

    /// Persist both slots.
    pub async fn save(&self, store: &dyn SecretStore) -> Result<(), SecretStoreError> {
        store.save_secret(ACCESS_TOKEN_SLOT, &self.access_token).await?;
        store.save_secret(REFRESH_TOKEN_SLOT, &self.refresh_token).await?;
        Ok(())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_token", &redact(&self.access_token))
            .field("refresh_token", &redact(&self.refresh_token))
            .field("expired", &self.expired)
            .finish()
    }
}

/// The platform application the bot signs in through.
#[derive(Clone, PartialEq)]
pub struct AppCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl AppCredentials {
    /// Read the application id and secret from the secret store.
    pub async fn load(store: &dyn SecretStore) -> Result<Self, SecretStoreError> {
        Ok(Self {
            client_id: store.get_secret(CLIENT_ID_SLOT).await?,
            client_secret: store.get_secret(CLIENT_SECRET_SLOT).await?,
        })
    }
}

impl fmt::Debug for AppCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &redact(&self.client_secret))
            .finish()
    }
}

fn redact(secret: &str) -> &'static str {
    if secret.is_empty() {
        "<empty>"
    } else {
        "[REDACTED]"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::InMemorySecrets;

    #[test]
    fn test_credentials_default_is_empty() {
        let creds = Credentials::default();
        assert!(!creds.has_access_token());
        assert!(!creds.has_refresh_token());
        assert!(!creds.expired);
    }

    #[test]
    fn test_debug_never_prints_tokens() {
        let creds = Credentials::new("secret-access", "secret-refresh");
        let printed = format!("{:?}", creds);
        assert!(!printed.contains("secret-access"));
        assert!(!printed.contains("secret-refresh"));
        assert!(printed.contains("[REDACTED]"));

        let app = AppCredentials {
            client_id: "client-abc".to_string(),
            client_secret: "hunter2".to_string(),
        };
        let printed = format!("{:?}", app);
        assert!(printed.contains("client-abc"));
        assert!(!printed.contains("hunter2"));
    }

    #[tokio::test]
    async fn test_load_absent_slots_as_empty() {
        let store = InMemorySecrets::new();
        let creds = Credentials::load(&store).await.unwrap();
        assert_eq!(creds, Credentials::default());
    }

    #[tokio::test]
    async fn test_save_writes_both_slots() {
        let store = InMemorySecrets::new();
        Credentials::new("access-1", "refresh-1")
            .save(&store)
            .await
            .unwrap();

        assert_eq!(store.get(ACCESS_TOKEN_SLOT), Some("access-1".to_string()));
        assert_eq!(store.get(REFRESH_TOKEN_SLOT), Some("refresh-1".to_string()));

        let reloaded = Credentials::load(&store).await.unwrap();
        assert_eq!(reloaded, Credentials::new("access-1", "refresh-1"));
    }

    #[tokio::test]
    async fn test_app_credentials_load() {
        let store = InMemorySecrets::new();
        store.insert(CLIENT_ID_SLOT, "cid");
        store.insert(CLIENT_SECRET_SLOT, "csecret");

        let app = AppCredentials::load(&store).await.unwrap();
        assert_eq!(app.client_id, "cid");
        assert_eq!(app.client_secret, "csecret");
    }
}
