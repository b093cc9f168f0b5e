//! HTTP client for the platform's OAuth identity endpoints.
//!
//! Covers token validation, refresh-token exchange, authorization-code
//! exchange and construction of the browser authorization URL.

use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Default base URL of the identity service.
pub const PLATFORM_AUTH_URL: &str = "https://id.twitch.tv";

/// Error type for identity endpoint calls
#[derive(Debug)]
pub enum PlatformApiError {
    /// HTTP request failed
    Http(reqwest::Error),
    /// JSON deserialization failed
    Json(serde_json::Error),
    /// Server returned a non-success status
    ServerError { status: u16, message: String },
}

impl std::fmt::Display for PlatformApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlatformApiError::Http(e) => write!(f, "HTTP error: {}", e),
            PlatformApiError::Json(e) => write!(f, "JSON error: {}", e),
            PlatformApiError::ServerError { status, message } => {
                write!(f, "Server error ({}): {}", status, message)
            }
        }
    }
}

impl std::error::Error for PlatformApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PlatformApiError::Http(e) => Some(e),
            PlatformApiError::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for PlatformApiError {
    fn from(e: reqwest::Error) -> Self {
        PlatformApiError::Http(e)
    }
}

impl From<serde_json::Error> for PlatformApiError {
    fn from(e: serde_json::Error) -> Self {
        PlatformApiError::Json(e)
    }
}

/// Response from the token endpoint (refresh and authorization-code grants).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub scope: Vec<String>,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// Response from the validation endpoint (GET /oauth2/validate).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidateResponse {
    pub client_id: String,
    pub login: String,
    pub user_id: String,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

/// Client for the platform identity service.
#[derive(Debug, Clone)]
pub struct PlatformAuthClient {
    /// Base URL for the identity service
    pub base_url: String,
    /// Reusable HTTP client
    client: Client,
}

impl PlatformAuthClient {
    /// Create a client against the production identity service.
    pub fn new() -> Self {
        Self::with_base_url(PLATFORM_AUTH_URL.to_string())
    }

    /// Create a client with a custom base URL.
    pub fn with_base_url(base_url: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }

    /// Validate an access token.
    ///
    /// GET /oauth2/validate
    ///
    /// Any non-success status means the token can no longer be used.
    pub async fn validate_token(
        &self,
        access_token: &str,
    ) -> Result<ValidateResponse, PlatformApiError> {
        let url = format!("{}/oauth2/validate", self.base_url);

        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("OAuth {}", access_token))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            return Err(PlatformApiError::ServerError { status, message });
        }

        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Exchange a refresh token for a new token pair.
    ///
    /// POST /oauth2/token (grant_type=refresh_token)
    pub async fn refresh_token(
        &self,
        client_id: &str,
        client_secret: &str,
        refresh_token: &str,
    ) -> Result<TokenResponse, PlatformApiError> {
        self.post_token(&[
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ])
        .await
    }

    /// Exchange an authorization code for a token pair.
    ///
    /// POST /oauth2/token (grant_type=authorization_code)
    pub async fn exchange_code(
        &self,
        client_id: &str,
        client_secret: &str,
        code: &str,
        redirect_uri: &str,
    ) -> Result<TokenResponse, PlatformApiError> {
        self.post_token(&[
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("code", code),
            ("grant_type", "authorization_code"),
            ("redirect_uri", redirect_uri),
        ])
        .await
    }

    async fn post_token(&self, form: &[(&str, &str)]) -> Result<TokenResponse, PlatformApiError> {
        let url = format!("{}/oauth2/token", self.base_url);

        let response = self.client.post(&url).form(form).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            return Err(PlatformApiError::ServerError { status, message });
        }

        let text = response.text().await?;
        serde_json::from_str::<TokenResponse>(&text).map_err(|e| PlatformApiError::ServerError {
            status: 0,
            message: format!(
                "Invalid token response: {}. Response: {}",
                e,
                text.chars().take(200).collect::<String>()
            ),
        })
    }

    /// Build the browser URL that starts the authorization-code handshake.
    ///
    /// Scopes are joined with `+` as the platform expects.
    pub fn authorize_url(
        &self,
        client_id: &str,
        redirect_uri: &str,
        scopes: &[&str],
        state: &str,
    ) -> String {
        let scope = scopes
            .iter()
            .map(|s| urlencoding::encode(s).into_owned())
            .collect::<Vec<_>>()
            .join("+");
        format!(
            "{}/oauth2/authorize?response_type=code&client_id={}&redirect_uri={}&scope={}&state={}",
            self.base_url,
            urlencoding::encode(client_id),
            urlencoding::encode(redirect_uri),
            scope,
            urlencoding::encode(state),
        )
    }
}

impl Default for PlatformAuthClient {
    fn default() -> Self {
        Self::new()
    }
}
