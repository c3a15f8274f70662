//! Types shared by the calendar sync layer.

use serde::{Deserialize, Serialize};

/// Sync error types.
///
/// Failures are values; nothing in the sync layer panics. The form
/// layer (or CLI) renders these to the user.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Credentials missing from configuration. Raised at client
    /// construction, before any network call.
    #[error("Calendar credentials not configured")]
    NotConfigured,

    #[error("Access token expired and no refresh token available")]
    NoRefreshToken,

    #[error("Token refresh failed: {0}")]
    TokenRefresh(String),

    /// Non-2xx from the calendar API, with the provider's error body.
    #[error("Calendar API error ({status}): {body}")]
    Provider { status: u16, body: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// One failed item in a best-effort pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncFailure {
    pub item_id: String,
    pub reason: String,
}

/// Outcome of a best-effort bulk pass.
///
/// `synced` counts items for which a remote create, update, or delete
/// actually happened; `skipped` counts items with nothing to do. The
/// split lets callers distinguish "nothing to do" from "something
/// failed".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncReport {
    pub synced: usize,
    pub skipped: usize,
    pub errors: Vec<SyncFailure>,
}

impl SyncReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// Record one per-item failure without aborting the pass.
    pub fn fail(&mut self, item_id: impl Into<String>, reason: impl std::fmt::Display) {
        self.errors.push(SyncFailure {
            item_id: item_id.into(),
            reason: reason.to_string(),
        });
    }
}
