//! OAuth2 Authorization Code flow for the calendar provider.
//!
//! 1. Opens the browser to the authorization URL (with a CSRF state)
//! 2. Starts a tiny localhost HTTP server to receive the callback
//! 3. Exchanges the code for an access token (+ refresh token)
//!
//! Token persistence is the caller's job; tokens are rows in the
//! clinic database, re-read on every sync call.

use base64::prelude::*;
use chrono::Utc;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::net::TcpListener;
use std::time::Duration;
use tracing::debug;

use crate::error::OAuthError;

/// Seconds a browser connection may idle before the callback read gives up.
const CALLBACK_READ_TIMEOUT_SECS: u64 = 300;

/// Access/refresh token pair as handed back by the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OAuthTokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// Unix timestamp of access-token expiry.
    pub expires_at: Option<i64>,
    pub token_type: String,
    pub scope: Option<String>,
}

impl OAuthTokens {
    /// True when the access token expires within `buffer_secs` from now.
    ///
    /// Tokens without a recorded expiry never report as expiring.
    pub fn expires_within(&self, buffer_secs: i64) -> bool {
        match self.expires_at {
            Some(exp) => Utc::now().timestamp() > exp - buffer_secs,
            None => false,
        }
    }
}

/// Provider endpoints and app credentials for the flow.
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub auth_url: String,
    pub token_url: String,
    pub scopes: Vec<String>,
    pub redirect_port: u16,
}

impl OAuthConfig {
    pub fn redirect_uri(&self) -> String {
        format!("http://localhost:{}/callback", self.redirect_port)
    }

    /// Full authorization URL including the CSRF state parameter.
    pub fn auth_url_full(&self, state: &str) -> String {
        let scopes = self.scopes.join(" ");
        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&state={}&access_type=offline&prompt=consent",
            self.auth_url,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.redirect_uri()),
            urlencoding::encode(&scopes),
            urlencoding::encode(state),
        )
    }
}

/// Run the full flow: open browser, listen for the callback, exchange
/// the code. Returns the fresh token pair for the caller to persist.
pub async fn authorize(config: &OAuthConfig) -> Result<OAuthTokens, OAuthError> {
    if config.client_id.is_empty() || config.client_secret.is_empty() {
        return Err(OAuthError::CredentialsNotConfigured);
    }

    let state = generate_csrf_state()?;
    let auth_url = config.auth_url_full(&state);
    open::that(&auth_url).map_err(|e| OAuthError::AuthorizationFailed(e.to_string()))?;

    let code = wait_for_callback(config.redirect_port, &state)?;
    debug!("received oauth callback, exchanging code");

    exchange_code(config, &code).await
}

/// Block on the localhost listener until the provider redirects back.
fn wait_for_callback(port: u16, expected_state: &str) -> Result<String, OAuthError> {
    let listener = TcpListener::bind(format!("127.0.0.1:{port}"))
        .map_err(|e| OAuthError::AuthorizationFailed(format!("bind callback port: {e}")))?;

    let (mut stream, _) = listener
        .accept()
        .map_err(|e| OAuthError::AuthorizationFailed(format!("accept callback: {e}")))?;
    stream
        .set_read_timeout(Some(Duration::from_secs(CALLBACK_READ_TIMEOUT_SECS)))
        .map_err(|e| OAuthError::AuthorizationFailed(e.to_string()))?;

    let mut buf = [0u8; 4096];
    let n = stream.read(&mut buf).map_err(|e| {
        if matches!(
            e.kind(),
            std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
        ) {
            OAuthError::CallbackTimeout {
                timeout_secs: CALLBACK_READ_TIMEOUT_SECS,
            }
        } else {
            OAuthError::AuthorizationFailed(e.to_string())
        }
    })?;
    let request = String::from_utf8_lossy(&buf[..n]);

    let callback = parse_callback(&request)?;
    if callback.state.as_deref() != Some(expected_state) {
        return Err(OAuthError::StateMismatch);
    }

    let response = "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\n\r\n<html><body><h2>Authentication successful!</h2><p>You can close this tab.</p><script>window.close()</script></body></html>";
    // Browser may already be gone; the code is what matters.
    let _ = stream.write_all(response.as_bytes());

    Ok(callback.code)
}

struct Callback {
    code: String,
    state: Option<String>,
}

/// Extract code and state from `GET /callback?code=...&state=...`.
fn parse_callback(request: &str) -> Result<Callback, OAuthError> {
    let first_line = request
        .lines()
        .next()
        .ok_or_else(|| OAuthError::InvalidCallback("empty request".to_string()))?;
    let path = first_line
        .split_whitespace()
        .nth(1)
        .ok_or_else(|| OAuthError::InvalidCallback("malformed request line".to_string()))?;
    let url = url::Url::parse(&format!("http://localhost{path}"))
        .map_err(|e| OAuthError::InvalidCallback(e.to_string()))?;

    if let Some((_, err)) = url.query_pairs().find(|(k, _)| k == "error") {
        return Err(OAuthError::AuthorizationFailed(err.to_string()));
    }

    let code = url
        .query_pairs()
        .find(|(k, _)| k == "code")
        .map(|(_, v)| v.to_string())
        .ok_or_else(|| OAuthError::InvalidCallback("no code in callback".to_string()))?;
    let state = url
        .query_pairs()
        .find(|(k, _)| k == "state")
        .map(|(_, v)| v.to_string());

    Ok(Callback { code, state })
}

/// Exchange an authorization code for tokens.
async fn exchange_code(config: &OAuthConfig, code: &str) -> Result<OAuthTokens, OAuthError> {
    let client = Client::new();
    let params = [
        ("client_id", config.client_id.as_str()),
        ("client_secret", config.client_secret.as_str()),
        ("code", code),
        ("grant_type", "authorization_code"),
        ("redirect_uri", &config.redirect_uri()),
    ];

    let resp = client
        .post(&config.token_url)
        .form(&params)
        .send()
        .await
        .map_err(|e| OAuthError::TokenExchangeFailed(e.to_string()))?;

    let body: serde_json::Value = resp
        .json()
        .await
        .map_err(|e| OAuthError::TokenExchangeFailed(e.to_string()))?;

    if let Some(error) = body.get("error") {
        return Err(OAuthError::TokenExchangeFailed(error.to_string()));
    }

    Ok(tokens_from_response(&body, None))
}

/// Build a token pair from the provider's JSON, falling back to
/// `previous_refresh` when the response carries no refresh token.
pub(crate) fn tokens_from_response(
    body: &serde_json::Value,
    previous_refresh: Option<&str>,
) -> OAuthTokens {
    let expires_in = body.get("expires_in").and_then(|v| v.as_i64());
    let expires_at = expires_in.map(|ei| Utc::now().timestamp() + ei);

    OAuthTokens {
        access_token: body["access_token"]
            .as_str()
            .unwrap_or_default()
            .to_string(),
        refresh_token: body
            .get("refresh_token")
            .and_then(|v| v.as_str())
            .map(String::from)
            .or_else(|| previous_refresh.map(String::from)),
        expires_at,
        token_type: body["token_type"].as_str().unwrap_or("Bearer").to_string(),
        scope: body.get("scope").and_then(|v| v.as_str()).map(String::from),
    }
}

/// Generate a cryptographically random state parameter for CSRF protection.
fn generate_csrf_state() -> Result<String, OAuthError> {
    let mut bytes = [0u8; 32];
    getrandom::getrandom(&mut bytes)
        .map_err(|e| OAuthError::AuthorizationFailed(format!("random state: {e}")))?;
    Ok(BASE64_URL_SAFE_NO_PAD.encode(bytes))
}
