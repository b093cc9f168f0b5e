//! Outbound reply delivery.

use async_trait::async_trait;

use crate::error::TransportError;

/// Sends reply text back over one transport.
///
/// The primary chat transport ignores `channel` and writes to the channel it
/// already joined. The secondary transport has no inline reply path and
/// requires `channel`, the out-of-band reference captured from the inbound
/// message.
#[async_trait]
pub trait ReplySink: Send + Sync {
    async fn send(&self, channel: Option<&str>, text: &str) -> Result<(), TransportError>;
}
