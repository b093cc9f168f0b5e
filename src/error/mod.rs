//! Error types for the bot.
//!
//! - **Auth**: credential acquisition failures, all fatal at startup
//! - **Secrets**: secret-store reads and writes
//! - **Transport**: chat, notification and feed connections
//!
//! Command-level problems (bad counter delta, short `access` arguments) are
//! not errors: they become chat replies inside the command handlers.

mod auth;
mod secrets;
mod transport;

pub use auth::AuthFailure;
pub use secrets::SecretStoreError;
pub use transport::TransportError;
