//! Reply sink that records outbound messages.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::error::TransportError;
use crate::traits::ReplySink;

/// One recorded send: the out-of-band channel reference and the text.
pub type SentReply = (Option<String>, String);

#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    sent: Arc<Mutex<Vec<SentReply>>>,
    should_fail: Arc<Mutex<bool>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything sent so far, including failed attempts.
    pub fn sent(&self) -> Vec<SentReply> {
        self.sent.lock().unwrap().clone()
    }

    /// Just the texts, in order.
    pub fn texts(&self) -> Vec<String> {
        self.sent().into_iter().map(|(_, text)| text).collect()
    }

    pub fn set_should_fail(&self, should_fail: bool) {
        *self.should_fail.lock().unwrap() = should_fail;
    }
}

#[async_trait]
impl ReplySink for RecordingSink {
    async fn send(&self, channel: Option<&str>, text: &str) -> Result<(), TransportError> {
        self.sent
            .lock()
            .unwrap()
            .push((channel.map(str::to_string), text.to_string()));
        if *self.should_fail.lock().unwrap() {
            return Err(TransportError::SendFailed("Mock send failure".to_string()));
        }
        Ok(())
    }
}
