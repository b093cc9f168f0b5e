//! Authorization prompt that hands URLs to the test instead of a browser.

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use crate::traits::AuthorizationPrompt;

#[derive(Debug, Clone, Default)]
pub struct CapturingPrompt {
    urls: Arc<Mutex<Vec<String>>>,
    notify: Option<mpsc::UnboundedSender<String>>,
}

impl CapturingPrompt {
    pub fn new() -> Self {
        Self::default()
    }

    /// A prompt plus a receiver that yields each URL as it is presented.
    pub fn with_channel() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                urls: Arc::default(),
                notify: Some(tx),
            },
            rx,
        )
    }

    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }
}

impl AuthorizationPrompt for CapturingPrompt {
    fn present(&self, url: &str) {
        self.urls.lock().unwrap().push(url.to_string());
        if let Some(tx) = &self.notify {
            let _ = tx.send(url.to_string());
        }
    }
}

/// Pull the `state` query parameter out of an authorization URL.
pub fn state_from_url(url: &str) -> Option<String> {
    let query = url.split_once('?')?.1;
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == "state")
        .and_then(|(_, value)| urlencoding::decode(value).ok())
        .map(|value| value.into_owned())
}
