//! Inbound web callback for the authorization-code redirect.

use std::net::SocketAddr;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::app::Shutdown;
use crate::auth::{AuthCallback, AuthCallbackSlot};

/// Path the platform redirects to.
pub const CALLBACK_PATH: &str = "/twitch_auth";

/// Page shown to the operator once the code was handed over.
pub const AUTH_DONE_HTML: &str = "<!DOCTYPE html>\
<html><head><title>Authentication is done</title></head>\
<body><p>Authentication is done, you can close this window.</p>\
<script>window.close();</script></body></html>";

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

impl CallbackQuery {
    /// Turn the query into a callback, or `None` if it carries neither a
    /// code nor an error.
    pub fn into_callback(self) -> Option<AuthCallback> {
        let state = self.state.unwrap_or_default();
        if let Some(error) = self.error {
            let reason = match self.error_description {
                Some(description) if !description.is_empty() => {
                    format!("{}: {}", error, description)
                }
                _ => error,
            };
            return Some(AuthCallback {
                code: String::new(),
                state,
                error: Some(reason),
            });
        }
        self.code.map(|code| AuthCallback::code(code, state))
    }
}

/// Start the callback listener.
///
/// Returns the server task and the bound address (useful with port 0).
pub async fn start_callback_server_on(
    addr: SocketAddr,
    slot: AuthCallbackSlot,
    mut shutdown: Shutdown,
) -> color_eyre::Result<(JoinHandle<()>, SocketAddr)> {
    let app = Router::new()
        .route(CALLBACK_PATH, get(callback_handler))
        .with_state(slot);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let actual_addr = listener.local_addr()?;

    info!("Auth callback listening on http://{}{}", actual_addr, CALLBACK_PATH);

    let handle = tokio::spawn(async move {
        let server = axum::serve(listener, app).with_graceful_shutdown(async move {
            shutdown.wait().await;
        });
        if let Err(e) = server.await {
            tracing::error!("Auth callback server error: {}", e);
        }
    });

    Ok((handle, actual_addr))
}

async fn callback_handler(
    State(slot): State<AuthCallbackSlot>,
    Query(query): Query<CallbackQuery>,
) -> Response {
    let Some(callback) = query.into_callback() else {
        return (StatusCode::BAD_REQUEST, "Missing code").into_response();
    };

    if slot.deliver(callback) {
        info!("Authorization callback received");
        Html(AUTH_DONE_HTML).into_response()
    } else {
        warn!("Authorization callback arrived with no sign-in in progress");
        (StatusCode::CONFLICT, "No authorization in progress").into_response()
    }
}
