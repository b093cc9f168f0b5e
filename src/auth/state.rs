//! Anti-forgery `state` values for the authorization-code handshake.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Generate an unpredictable, URL-safe state string.
///
/// SHA-256 of a nanosecond timestamp and a random v4 UUID.
pub fn generate_state() -> String {
    let now = chrono::Utc::now();
    let nanos = now
        .timestamp_nanos_opt()
        .unwrap_or_else(|| now.timestamp_micros().saturating_mul(1_000));

    let mut hasher = Sha256::new();
    hasher.update(nanos.to_string().as_bytes());
    hasher.update(uuid::Uuid::new_v4().as_bytes());
    URL_SAFE_NO_PAD.encode(hasher.finalize())
}

/// Compare the generated state with the one echoed back by the callback.
///
/// Runs in time independent of where the first difference is.
pub fn states_match(expected: &str, received: &str) -> bool {
    if expected.is_empty() {
        return false;
    }
    expected.as_bytes().ct_eq(received.as_bytes()).into()
}
