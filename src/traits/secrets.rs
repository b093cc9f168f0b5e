//! Secret store trait abstraction.
//!
//! The credential manager is the only component that reads or writes the
//! token slots. Startup also reads the application secrets through it.

use async_trait::async_trait;

use crate::error::SecretStoreError;

/// Durable get/set of named secrets.
///
/// # Example
///
/// ```ignore
/// use streambot::traits::SecretStore;
///
/// async fn rotate<S: SecretStore>(store: &S, token: &str) -> Result<(), SecretStoreError> {
///     let previous = store.get_secret("TwitchAccessToken").await?;
///     if previous != token {
///         store.save_secret("TwitchAccessToken", token).await?;
///     }
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Read a secret by name.
    ///
    /// Returns an empty string when the secret does not exist.
    async fn get_secret(&self, name: &str) -> Result<String, SecretStoreError>;

    /// Write a secret, replacing any previous value.
    async fn save_secret(&self, name: &str, value: &str) -> Result<(), SecretStoreError>;

    /// Identity the store recognises us as. Empty means not authenticated.
    async fn whoami(&self) -> Result<String, SecretStoreError>;
}
