//! Operator-facing presentation of the authorization URL.

use tracing::warn;

use crate::traits::AuthorizationPrompt;

/// Prints the URL and, unless disabled, opens it in the default browser.
#[derive(Debug, Clone)]
pub struct BrowserPrompt {
    open_browser: bool,
}

impl BrowserPrompt {
    pub fn new(open_browser: bool) -> Self {
        Self { open_browser }
    }
}

impl AuthorizationPrompt for BrowserPrompt {
    fn present(&self, url: &str) {
        println!("Sign in to authorize the bot:\n  {}", url);
        if self.open_browser {
            if let Err(e) = open::that(url) {
                warn!("Could not open a browser ({}); visit the URL above manually", e);
            }
        }
    }
}
