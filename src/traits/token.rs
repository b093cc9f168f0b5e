//! Access token supply for transports that authenticate with it.

use async_trait::async_trait;

use crate::error::AuthFailure;

/// Supplies the chat transport with an access token.
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// The token obtained at startup (or by the last renewal).
    async fn current_token(&self) -> Option<String>;

    /// Obtain a fresh token without operator interaction.
    ///
    /// Implementations must never fall back to the interactive flow here:
    /// this is called from a running transport.
    async fn renew_token(&self) -> Result<String, AuthFailure>;
}
