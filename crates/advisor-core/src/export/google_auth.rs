use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::CredentialProvider;
use crate::constants::{endpoints, keys};
use crate::context::KeyValueStore;
use crate::error::{AdvisorError, Result};

#[derive(Debug, Clone)]
pub struct GoogleAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub scopes: Vec<String>,
    pub auth_endpoint: String,
    pub token_endpoint: String,
}

impl GoogleAuthConfig {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri: endpoints::DEFAULT_REDIRECT_URI.to_string(),
            scopes: endpoints::GOOGLE_SCOPES.iter().map(|s| s.to_string()).collect(),
            auth_endpoint: endpoints::GOOGLE_AUTH_URL.to_string(),
            token_endpoint: endpoints::GOOGLE_TOKEN_URL.to_string(),
        }
    }

    pub fn with_redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.redirect_uri = uri.into();
        self
    }
}

/// Token as persisted under `google_auth_token`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredToken {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
    /// Unix millis when the token was obtained.
    #[serde(default)]
    pub timestamp: Option<i64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

impl StoredToken {
    pub fn is_expired_at(&self, now_millis: i64) -> bool {
        match (self.timestamp, self.expires_in) {
            (Some(ts), Some(expires_in)) => {
                let lifetime_ms = i64::try_from(expires_in)
                    .unwrap_or(i64::MAX)
                    .saturating_mul(1000);
                now_millis >= ts.saturating_add(lifetime_ms)
            }
            _ => false,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
    #[serde(default)]
    refresh_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// Google OAuth 2 authorization-code flow with the token kept in durable storage.
pub struct GoogleAuth {
    config: GoogleAuthConfig,
    store: Arc<dyn KeyValueStore>,
    client: reqwest::Client,
    open_browser: bool,
}

impl GoogleAuth {
    pub fn new(config: GoogleAuthConfig, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            config,
            store,
            client: reqwest::Client::new(),
            open_browser: true,
        }
    }

    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Only log the consent URL on `initiate_auth`; never launch a browser.
    pub fn without_browser(mut self) -> Self {
        self.open_browser = false;
        self
    }

    pub fn authorization_url(&self) -> String {
        let scope = self.config.scopes.join(" ");
        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("response_type", "code"),
            ("scope", scope.as_str()),
            ("access_type", "offline"),
            ("prompt", "consent"),
        ];
        let query = params
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        format!("{}?{}", self.config.auth_endpoint, query)
    }

    /// Exchange an authorization code (or the full redirect URL carrying it)
    /// for a token and persist it.
    pub async fn handle_callback(&self, code_or_url: &str) -> Result<StoredToken> {
        let code = extract_code(code_or_url)
            .ok_or_else(|| AdvisorError::Auth("No authorization code found".to_string()))?;

        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
            ("code", code.as_str()),
        ];

        let response = self
            .client
            .post(&self.config.token_endpoint)
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let reason = serde_json::from_str::<TokenErrorResponse>(&body)
                .map(|e| match e.error_description {
                    Some(desc) => format!("{}: {}", e.error, desc),
                    None => e.error,
                })
                .unwrap_or_else(|_| status.to_string());
            return Err(AdvisorError::Auth(format!("Failed to obtain access token: {reason}")));
        }

        let token: TokenResponse = serde_json::from_str(&body)?;
        let stored = StoredToken {
            access_token: token.access_token,
            expires_in: token.expires_in,
            timestamp: Some(chrono::Utc::now().timestamp_millis()),
            refresh_token: token.refresh_token,
        };

        self.store
            .set(keys::GOOGLE_AUTH_TOKEN, &serde_json::to_string(&stored)?)?;
        tracing::info!("Google access token stored");

        Ok(stored)
    }

    pub fn stored_token(&self) -> Option<StoredToken> {
        let raw = match self.store.get(keys::GOOGLE_AUTH_TOKEN) {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!("Failed to read stored token: {e}");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(token) => Some(token),
            Err(e) => {
                tracing::warn!("Ignoring unreadable stored token: {e}");
                None
            }
        }
    }

    pub fn logout(&self) -> Result<()> {
        self.store.remove(keys::GOOGLE_AUTH_TOKEN)
    }

    fn launch_browser(url: &str) {
        let opener = if cfg!(target_os = "macos") {
            "open"
        } else if cfg!(target_os = "windows") {
            "cmd"
        } else {
            "xdg-open"
        };

        let mut cmd = std::process::Command::new(opener);
        if cfg!(target_os = "windows") {
            cmd.args(["/C", "start", "", url]);
        } else {
            cmd.arg(url);
        }
        cmd.stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null());

        if let Err(e) = cmd.spawn() {
            tracing::warn!("Could not open browser ({opener}): {e}");
        }
    }
}

impl CredentialProvider for GoogleAuth {
    fn initiate_auth(&self) {
        let url = self.authorization_url();
        tracing::info!(%url, "Starting Google authorization");
        if self.open_browser {
            Self::launch_browser(&url);
        }
    }

    fn access_token(&self) -> Option<String> {
        let token = self.stored_token()?;
        if token.is_expired_at(chrono::Utc::now().timestamp_millis()) {
            tracing::info!("Stored Google token has expired");
            return None;
        }
        Some(token.access_token)
    }
}

/// Accepts either a bare code or a redirect URL with a `code=` parameter.
pub(crate) fn extract_code(input: &str) -> Option<String> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if !input.contains("code=") {
        return Some(input.to_string());
    }

    let query = input.split_once('?').map(|(_, q)| q).unwrap_or(input);
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(k, _)| *k == "code")
        .and_then(|(_, v)| urlencoding::decode(v).ok())
        .map(|v| v.into_owned())
        .filter(|v| !v.is_empty())
}
