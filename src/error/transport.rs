//! Transport errors shared by the chat, notification and feed adapters.

use thiserror::Error;

/// Failures of a transport connection or an outbound send.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    #[error("disconnected from server")]
    Disconnected,

    /// The server refused our credentials.
    #[error("authentication rejected: {0}")]
    AuthRejected(String),

    #[error("send failed: {0}")]
    SendFailed(String),

    /// A reply for the secondary transport had no channel to go to.
    #[error("no reply destination")]
    NoDestination,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("transport shut down")]
    Shutdown,
}

impl TransportError {
    /// Whether reconnecting with backoff can help.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TransportError::ConnectionFailed(_)
                | TransportError::Disconnected
                | TransportError::SendFailed(_)
                | TransportError::Http(_)
                | TransportError::Protocol(_)
        )
    }
}
