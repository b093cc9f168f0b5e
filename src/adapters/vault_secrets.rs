//! Remote vault secret store over HTTP.
//!
//! The vault authenticates the bot by its client id and a PEM client
//! certificate (mutual TLS).
//!
//! Endpoints:
//! - `GET /secrets/{name}` -> `{"value": "..."}`, 404 when absent
//! - `PUT /secrets/{name}` with `{"value": "..."}`
//! - `GET /whoami` -> `{"identity": "..."}`

use std::path::Path;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::SecretStoreError;
use crate::traits::SecretStore;

/// Header carrying the vault client id.
pub const CLIENT_ID_HEADER: &str = "X-Client-Id";

#[derive(Debug, Serialize, Deserialize)]
struct SecretBody {
    value: String,
}

#[derive(Debug, Deserialize)]
struct WhoamiResponse {
    identity: String,
}

#[derive(Debug, Clone)]
pub struct VaultSecretStore {
    base_url: String,
    client_id: String,
    client: Client,
}

impl VaultSecretStore {
    /// Build a store that presents `certificate_pem` (certificate and private
    /// key, PEM encoded) as its TLS client identity.
    pub fn new(
        base_url: &str,
        client_id: &str,
        certificate_pem: &[u8],
    ) -> Result<Self, SecretStoreError> {
        let identity = reqwest::Identity::from_pem(certificate_pem)
            .map_err(|e| SecretStoreError::Certificate(e.to_string()))?;
        let client = Client::builder()
            .use_rustls_tls()
            .identity(identity)
            .build()
            .map_err(|e| SecretStoreError::Certificate(e.to_string()))?;
        Ok(Self::with_client(base_url, client_id, client))
    }

    /// Read the PEM identity from `path` and build the store.
    pub async fn from_certificate_file(
        base_url: &str,
        client_id: &str,
        path: &Path,
    ) -> Result<Self, SecretStoreError> {
        let pem = tokio::fs::read(path).await.map_err(|e| {
            SecretStoreError::Certificate(format!("{}: {}", path.display(), e))
        })?;
        Self::new(base_url, client_id, &pem)
    }

    /// Build a store around an existing client (no client certificate).
    pub fn with_client(base_url: &str, client_id: &str, client: Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client_id: client_id.to_string(),
            client,
        }
    }

    fn secret_url(&self, name: &str) -> String {
        format!("{}/secrets/{}", self.base_url, urlencoding::encode(name))
    }
}

#[async_trait]
impl SecretStore for VaultSecretStore {
    async fn get_secret(&self, name: &str) -> Result<String, SecretStoreError> {
        let response = self
            .client
            .get(self.secret_url(name))
            .header(CLIENT_ID_HEADER, &self.client_id)
            .send()
            .await
            .map_err(|e| SecretStoreError::Unavailable(e.to_string()))?;

        let read_failed = |message: String| SecretStoreError::ReadFailed {
            name: name.to_string(),
            message,
        };

        match response.status() {
            StatusCode::NOT_FOUND => {
                debug!("Secret '{}' not present in vault", name);
                Ok(String::new())
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(SecretStoreError::NotAuthenticated)
            }
            status if status.is_success() => {
                let body: SecretBody = response
                    .json()
                    .await
                    .map_err(|e| read_failed(e.to_string()))?;
                Ok(body.value)
            }
            status => Err(read_failed(format!("HTTP {}", status.as_u16()))),
        }
    }

    async fn save_secret(&self, name: &str, value: &str) -> Result<(), SecretStoreError> {
        let response = self
            .client
            .put(self.secret_url(name))
            .header(CLIENT_ID_HEADER, &self.client_id)
            .json(&SecretBody {
                value: value.to_string(),
            })
            .send()
            .await
            .map_err(|e| SecretStoreError::Unavailable(e.to_string()))?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(SecretStoreError::NotAuthenticated)
            }
            status if status.is_success() => Ok(()),
            status => Err(SecretStoreError::SaveFailed {
                name: name.to_string(),
                message: format!("HTTP {}", status.as_u16()),
            }),
        }
    }

    async fn whoami(&self) -> Result<String, SecretStoreError> {
        let response = self
            .client
            .get(format!("{}/whoami", self.base_url))
            .header(CLIENT_ID_HEADER, &self.client_id)
            .send()
            .await
            .map_err(|e| SecretStoreError::Unavailable(e.to_string()))?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(SecretStoreError::NotAuthenticated)
            }
            status if status.is_success() => {
                let body: WhoamiResponse = response
                    .json()
                    .await
                    .map_err(|e| SecretStoreError::Unavailable(e.to_string()))?;
                Ok(body.identity)
            }
            status => Err(SecretStoreError::Unavailable(format!(
                "whoami returned HTTP {}",
                status.as_u16()
            ))),
        }
    }
}
