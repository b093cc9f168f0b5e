//! Startup: configuration, secret store bootstrap and sign-in.
//!
//! - [`config`] - [`BotConfig`] defaults, env overrides and builder
//! - [`secrets`] - choose and authenticate the secret store
//! - [`auth`] - build the credential manager and acquire a token
//!
//! ```ignore
//! let config = BotConfig::from_env(&args.chat_identity);
//! let secrets = open_secret_store(&config, &args.client_id, &args.certificate_path).await?;
//! authenticate_store(secrets.as_ref()).await?;
//! let manager = build_credential_manager(&config, secrets, slot, prompt).await?;
//! let signed_in = sign_in(&manager).await?;
//! ```

pub mod auth;
pub mod config;
pub mod secrets;

pub use auth::{build_credential_manager, sign_in, SignedIn};
pub use config::BotConfig;
pub use secrets::{authenticate_store, open_secret_store, SecretBootstrapError};
