//! Secret store bootstrap.
//!
//! The client certificate must exist before anything else starts. With a
//! vault URL configured the certificate authenticates us to the vault;
//! otherwise secrets live in a JSON file in the data directory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use super::config::BotConfig;
use crate::adapters::{FileSecretStore, VaultSecretStore};
use crate::error::SecretStoreError;
use crate::traits::SecretStore;

#[derive(Debug, Error)]
pub enum SecretBootstrapError {
    #[error("certificate not found at {0}")]
    MissingCertificate(PathBuf),

    #[error("secret store did not report an identity")]
    NoIdentity,

    #[error(transparent)]
    Store(#[from] SecretStoreError),
}

/// Build the configured secret store.
pub async fn open_secret_store(
    config: &BotConfig,
    client_id: &str,
    certificate_path: &Path,
) -> Result<Arc<dyn SecretStore>, SecretBootstrapError> {
    if !certificate_path.exists() {
        return Err(SecretBootstrapError::MissingCertificate(
            certificate_path.to_path_buf(),
        ));
    }

    match &config.vault_url {
        Some(url) => {
            info!("Using secret vault at {}", url);
            let store = VaultSecretStore::from_certificate_file(url, client_id, certificate_path).await?;
            Ok(Arc::new(store))
        }
        None => {
            let store = FileSecretStore::in_dir(&config.data_dir);
            info!("Using file secret store at {}", store.path().display());
            Ok(Arc::new(store))
        }
    }
}

/// Confirm the store knows who we are and return that identity.
pub async fn authenticate_store(store: &dyn SecretStore) -> Result<String, SecretBootstrapError> {
    let identity = store.whoami().await?;
    if identity.trim().is_empty() {
        return Err(SecretBootstrapError::NoIdentity);
    }
    info!("Authenticated with secret store: {}", identity);
    Ok(identity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::InMemorySecrets;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_certificate_is_rejected() {
        let dir = TempDir::new().unwrap();
        let config = BotConfig::new("bot").with_data_dir(dir.path());
        let result = open_secret_store(&config, "client", &dir.path().join("nope.pem")).await;
        assert!(matches!(
            result,
            Err(SecretBootstrapError::MissingCertificate(_))
        ));
    }

    #[tokio::test]
    async fn test_file_store_without_vault_url() {
        let dir = TempDir::new().unwrap();
        let cert = dir.path().join("bot.pem");
        std::fs::write(&cert, "placeholder").unwrap();
        let config = BotConfig::new("bot").with_data_dir(dir.path());

        let store = open_secret_store(&config, "client", &cert).await.unwrap();
        let identity = authenticate_store(store.as_ref()).await.unwrap();
        assert!(identity.starts_with("file:"));
    }

    #[tokio::test]
    async fn test_empty_identity_is_rejected() {
        let store = InMemorySecrets::new();
        store.set_identity("");
        assert!(matches!(
            authenticate_store(&store).await,
            Err(SecretBootstrapError::NoIdentity)
        ));
    }

    #[tokio::test]
    async fn test_identity_is_returned() {
        let store = InMemorySecrets::new();
        store.set_identity("bot@vault");
        assert_eq!(authenticate_store(&store).await.unwrap(), "bot@vault");
    }
}
