//! Calendar provider HTTP client: event CRUD with token lifecycle.
//!
//! One client per request-scoped operation. The caller loads tokens
//! from the store, hands them in, and persists whatever
//! [`CalendarClient::tokens`] holds afterwards (a refresh may have
//! replaced the access token).

use reqwest::StatusCode;
use serde_json::Value;
use tracing::{debug, warn};

use crate::calendar::EventDescriptor;
use crate::integrations::oauth::{tokens_from_response, OAuthTokens};
use crate::sync::types::SyncError;

/// Seconds before expiry at which the access token is refreshed.
pub const TOKEN_EXPIRY_BUFFER_SECS: i64 = 60;

const DEFAULT_API_BASE_URL: &str = "https://www.googleapis.com/calendar/v3";
const DEFAULT_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Provider endpoints and app credentials, injected at construction so
/// the client can be pointed at a test server.
#[derive(Debug, Clone)]
pub struct CalendarConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Target calendar; `"primary"` is the account's main calendar.
    pub calendar_id: String,
    pub api_base_url: String,
    pub token_url: String,
}

impl CalendarConfig {
    pub fn new(client_id: &str, client_secret: &str) -> Self {
        Self {
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            calendar_id: "primary".to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
        }
    }
}

/// Calendar provider API client.
pub struct CalendarClient {
    config: CalendarConfig,
    tokens: OAuthTokens,
    http: reqwest::Client,
}

impl CalendarClient {
    /// Fails when credentials are missing, before any network call.
    pub fn new(config: CalendarConfig, tokens: OAuthTokens) -> Result<Self, SyncError> {
        if config.client_id.is_empty() || config.client_secret.is_empty() {
            return Err(SyncError::NotConfigured);
        }
        Ok(Self {
            config,
            tokens,
            http: reqwest::Client::new(),
        })
    }

    /// Tokens as they stand after the last call, for the caller to
    /// persist.
    pub fn tokens(&self) -> &OAuthTokens {
        &self.tokens
    }

    /// Create a remote event, returning its id.
    pub async fn create_event(&mut self, event: &EventDescriptor) -> Result<String, SyncError> {
        let token = self.access_token().await?;
        let resp = self
            .http
            .post(self.events_url())
            .bearer_auth(&token)
            .json(&event.to_api_body())
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            warn!(status = status.as_u16(), %body, "event create rejected");
            return Err(SyncError::Provider {
                status: status.as_u16(),
                body,
            });
        }

        let json: Value = serde_json::from_str(&body)?;
        json["id"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| SyncError::Provider {
                status: status.as_u16(),
                body: "response missing event id".to_string(),
            })
    }

    /// Partial update of an existing remote event.
    pub async fn update_event(
        &mut self,
        event_id: &str,
        event: &EventDescriptor,
    ) -> Result<(), SyncError> {
        let token = self.access_token().await?;
        let resp = self
            .http
            .patch(self.event_url(event_id))
            .bearer_auth(&token)
            .json(&event.to_api_body())
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), %body, "event update rejected");
            return Err(SyncError::Provider {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }

    /// Delete a remote event. An event the provider already dropped
    /// (410 Gone, or 404 after permanent removal) counts as success.
    pub async fn delete_event(&mut self, event_id: &str) -> Result<(), SyncError> {
        let token = self.access_token().await?;
        let resp = self
            .http
            .delete(self.event_url(event_id))
            .bearer_auth(&token)
            .send()
            .await?;

        let status = resp.status();
        if status == StatusCode::GONE || status == StatusCode::NOT_FOUND {
            debug!(event_id, "event already gone");
            return Ok(());
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), %body, "event delete rejected");
            return Err(SyncError::Provider {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }

    /// Valid bearer token, refreshing when expiry is near.
    ///
    /// The refresh exchange keeps the original refresh token when the
    /// provider's response omits one. No retry beyond this single
    /// refresh path.
    async fn access_token(&mut self) -> Result<String, SyncError> {
        if !self.tokens.expires_within(TOKEN_EXPIRY_BUFFER_SECS) {
            return Ok(self.tokens.access_token.clone());
        }

        let refresh = self
            .tokens
            .refresh_token
            .clone()
            .ok_or(SyncError::NoRefreshToken)?;
        debug!("access token near expiry, refreshing");

        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("refresh_token", refresh.as_str()),
            ("grant_type", "refresh_token"),
        ];
        let resp = self
            .http
            .post(&self.config.token_url)
            .form(&params)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            warn!(status = status.as_u16(), %body, "token refresh rejected");
            return Err(SyncError::TokenRefresh(format!("{status}: {body}")));
        }

        let json: Value = serde_json::from_str(&body)?;
        if let Some(error) = json.get("error") {
            return Err(SyncError::TokenRefresh(error.to_string()));
        }

        self.tokens = tokens_from_response(&json, Some(&refresh));
        Ok(self.tokens.access_token.clone())
    }

    fn events_url(&self) -> String {
        format!(
            "{}/calendars/{}/events",
            self.config.api_base_url,
            urlencoding::encode(&self.config.calendar_id)
        )
    }

    fn event_url(&self, event_id: &str) -> String {
        format!("{}/{}", self.events_url(), urlencoding::encode(event_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens() -> OAuthTokens {
        OAuthTokens {
            access_token: "tok".to_string(),
            refresh_token: Some("refresh".to_string()),
            expires_at: Some(chrono::Utc::now().timestamp() + 3600),
            token_type: "Bearer".to_string(),
            scope: None,
        }
    }

    #[test]
    fn construction_requires_credentials() {
        let config = CalendarConfig::new("", "");
        assert!(matches!(
            CalendarClient::new(config, tokens()),
            Err(SyncError::NotConfigured)
        ));

        let config = CalendarConfig::new("cid", "secret");
        assert!(CalendarClient::new(config, tokens()).is_ok());
    }

    #[test]
    fn urls_escape_ids() {
        let mut config = CalendarConfig::new("cid", "secret");
        config.calendar_id = "team calendar@example.com".to_string();
        let client = CalendarClient::new(config, tokens()).unwrap();
        assert_eq!(
            client.events_url(),
            format!("{DEFAULT_API_BASE_URL}/calendars/team%20calendar%40example.com/events")
        );
        assert!(client.event_url("ev 1").ends_with("/events/ev%201"));
    }

    #[test]
    fn default_config_targets_primary_calendar() {
        let config = CalendarConfig::new("cid", "secret");
        assert_eq!(config.calendar_id, "primary");
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.token_url, DEFAULT_TOKEN_URL);
    }
}
