//! Local HTTP listeners.

pub mod callback;

pub use callback::{start_callback_server_on, CALLBACK_PATH};
