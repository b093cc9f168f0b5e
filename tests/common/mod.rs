//! Common test utilities for integration tests.
//!
//! Fixtures for the identity service (wiremock bodies and mounts), a
//! credential manager wired to in-memory secrets, and a router harness
//! backed by a temporary data directory.

#![allow(dead_code)]

use std::sync::Arc;

use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::sync::mpsc;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use streambot::adapters::mock::{CapturingPrompt, InMemorySecrets, RecordingSink};
use streambot::auth::credentials::{
    ACCESS_TOKEN_SLOT, CLIENT_ID_SLOT, CLIENT_SECRET_SLOT, REFRESH_TOKEN_SLOT,
};
use streambot::auth::{AppCredentials, AuthCallbackSlot, AuthSettings, CredentialManager, PlatformAuthClient};
use streambot::commands::{CommandRouter, ReplyRoutes, RouterLoop};
use streambot::state::{AccessControlList, CounterStore};
use streambot::storage::BlobStore;
use streambot::traits::ReplySink;

pub const CLIENT_ID: &str = "test-client-id";
pub const CLIENT_SECRET: &str = "test-client-secret";
pub const REDIRECT_URI: &str = "http://localhost:51145/twitch_auth";

/// Body of a successful `GET /oauth2/validate`.
pub fn validate_body(login: &str, user_id: &str) -> Value {
    json!({
        "client_id": CLIENT_ID,
        "login": login,
        "user_id": user_id,
        "scopes": ["chat:read", "chat:edit"],
        "expires_in": 5000
    })
}

/// Body of a successful `POST /oauth2/token`.
pub fn token_body(access: &str, refresh: &str) -> Value {
    json!({
        "access_token": access,
        "refresh_token": refresh,
        "expires_in": 14400,
        "scope": ["chat:read", "chat:edit"],
        "token_type": "bearer"
    })
}

pub async fn mount_validate_ok(server: &MockServer, token: &str) {
    Mock::given(method("GET"))
        .and(path("/oauth2/validate"))
        .and(header("Authorization", format!("OAuth {}", token).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(validate_body("streambot", "1234")))
        .mount(server)
        .await;
}

pub async fn mount_validate_rejected(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/oauth2/validate"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({"status": 401, "message": "invalid access token"})),
        )
        .mount(server)
        .await;
}

/// In-memory secrets holding the app credentials and, optionally, a pair.
pub fn secrets_with(access: Option<&str>, refresh: Option<&str>) -> InMemorySecrets {
    let secrets = InMemorySecrets::new();
    secrets.insert(CLIENT_ID_SLOT, CLIENT_ID);
    secrets.insert(CLIENT_SECRET_SLOT, CLIENT_SECRET);
    if let Some(access) = access {
        secrets.insert(ACCESS_TOKEN_SLOT, access);
    }
    if let Some(refresh) = refresh {
        secrets.insert(REFRESH_TOKEN_SLOT, refresh);
    }
    secrets
}

/// A credential manager pointed at `server`.
pub fn manager(
    server: &MockServer,
    secrets: &InMemorySecrets,
    callbacks: AuthCallbackSlot,
    prompt: CapturingPrompt,
) -> CredentialManager {
    CredentialManager::new(
        Arc::new(secrets.clone()),
        PlatformAuthClient::with_base_url(server.uri()),
        AppCredentials {
            client_id: CLIENT_ID.to_string(),
            client_secret: CLIENT_SECRET.to_string(),
        },
        AuthSettings::new(REDIRECT_URI),
        callbacks,
        Arc::new(prompt),
    )
}

/// Router wired to recording sinks and a temporary data directory.
pub struct RouterHarness {
    pub dir: TempDir,
    pub acl: Arc<AccessControlList>,
    pub counters: Arc<CounterStore>,
    pub primary: RecordingSink,
    pub companion: RecordingSink,
}

impl RouterHarness {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let store = BlobStore::new(dir.path());
        let acl = Arc::new(AccessControlList::load(store.clone()).unwrap());
        let counters = Arc::new(CounterStore::load(store).unwrap());
        Self {
            dir,
            acl,
            counters,
            primary: RecordingSink::new(),
            companion: RecordingSink::new(),
        }
    }

    pub fn store(&self) -> BlobStore {
        BlobStore::new(self.dir.path())
    }

    pub fn router_loop(&self) -> RouterLoop {
        self.router_loop_with_primary(Arc::new(self.primary.clone()))
    }

    /// Same router, but primary replies go to `primary`.
    pub fn router_loop_with_primary(&self, primary: Arc<dyn ReplySink>) -> RouterLoop {
        let router = CommandRouter::new(
            '!',
            "https://discord.gg/6fP8vWW",
            self.acl.clone(),
            self.counters.clone(),
        );
        RouterLoop::new(
            router,
            ReplyRoutes {
                primary,
                companion: Some(Arc::new(self.companion.clone())),
            },
        )
    }
}

/// Wait until `rx` yields a value or a second passes.
pub async fn recv_within<T>(rx: &mut mpsc::UnboundedReceiver<T>) -> T {
    tokio::time::timeout(std::time::Duration::from_secs(1), rx.recv())
        .await
        .expect("timed out")
        .expect("channel closed")
}
