//! Secret store errors.

use thiserror::Error;

/// Failures reading or writing named secrets.
#[derive(Debug, Clone, Error)]
pub enum SecretStoreError {
    /// The store rejected our identity.
    #[error("not authenticated with the secret store")]
    NotAuthenticated,

    /// The store could not be reached.
    #[error("secret store unavailable: {0}")]
    Unavailable(String),

    /// Reading a secret failed.
    #[error("failed to read secret '{name}': {message}")]
    ReadFailed { name: String, message: String },

    /// Writing a secret failed.
    #[error("failed to save secret '{name}': {message}")]
    SaveFailed { name: String, message: String },

    /// The backing file or response body could not be decoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Client certificate could not be loaded.
    #[error("invalid client certificate: {0}")]
    Certificate(String),
}
