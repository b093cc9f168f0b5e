//! Hand-off of the authorization URL to the operator.

/// Shows the operator where to sign in.
///
/// Opening a browser or printing the link is outside the credential
/// manager's contract; it only needs somebody to present the URL.
pub trait AuthorizationPrompt: Send + Sync {
    fn present(&self, url: &str);
}
