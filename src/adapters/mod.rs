//! Concrete implementations of trait abstractions.
//!
//! # Adapters
//!
//! - [`FileSecretStore`] - secrets in a local JSON file
//! - [`VaultSecretStore`] - secrets in a remote vault over mutual TLS
//! - [`BrowserPrompt`] - prints the sign-in URL and opens a browser
//!
//! # Mock Implementations
//!
//! The [`mock`] submodule provides test doubles:
//! - [`mock::InMemorySecrets`] - in-memory secret slots with failure toggles
//! - [`mock::RecordingSink`] - records outbound replies
//! - [`mock::CapturingPrompt`] - captures authorization URLs

pub mod browser_prompt;
pub mod file_secrets;
pub mod mock;
pub mod vault_secrets;

pub use browser_prompt::BrowserPrompt;
pub use file_secrets::FileSecretStore;
pub use mock::{CapturingPrompt, InMemorySecrets, RecordingSink};
pub use vault_secrets::VaultSecretStore;
