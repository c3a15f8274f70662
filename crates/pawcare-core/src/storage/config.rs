//! TOML-based application configuration.
//!
//! Holds the calendar provider credentials and endpoints plus reminder
//! defaults. Stored at `~/.config/pawcare/config.toml`; the sync
//! client and OAuth flow receive their settings from here at
//! construction, never reading them ad hoc mid-operation.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::data_dir;
use crate::error::{ConfigError, Result};
use crate::integrations::oauth::OAuthConfig;
use crate::schedule::DEFAULT_SLOT_CAP;
use crate::sync::CalendarConfig;

/// Calendar provider settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarSection {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    /// Target calendar; "primary" is the account's main calendar.
    #[serde(default = "default_calendar_id")]
    pub calendar_id: String,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_token_url")]
    pub token_url: String,
    #[serde(default = "default_auth_url")]
    pub auth_url: String,
    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,
    #[serde(default = "default_redirect_port")]
    pub redirect_port: u16,
}

/// Reminder generation defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemindersSection {
    /// Minutes before a dose at which the popup fires.
    #[serde(default = "default_medication_lead_min")]
    pub medication_lead_min: u32,
    /// Minutes before an appointment at which the popup fires.
    #[serde(default = "default_appointment_lead_min")]
    pub appointment_lead_min: u32,
    /// Maximum dose times per schedule.
    #[serde(default = "default_slot_cap")]
    pub slot_cap: usize,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/pawcare/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub calendar: CalendarSection,
    #[serde(default)]
    pub reminders: RemindersSection,
}

// Default functions
fn default_calendar_id() -> String {
    "primary".into()
}
fn default_api_base_url() -> String {
    "https://www.googleapis.com/calendar/v3".into()
}
fn default_token_url() -> String {
    "https://oauth2.googleapis.com/token".into()
}
fn default_auth_url() -> String {
    "https://accounts.google.com/o/oauth2/v2/auth".into()
}
fn default_scopes() -> Vec<String> {
    vec!["https://www.googleapis.com/auth/calendar.events".into()]
}
fn default_redirect_port() -> u16 {
    8721
}
fn default_medication_lead_min() -> u32 {
    10
}
fn default_appointment_lead_min() -> u32 {
    60
}
fn default_slot_cap() -> usize {
    DEFAULT_SLOT_CAP
}

impl Default for CalendarSection {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            calendar_id: default_calendar_id(),
            api_base_url: default_api_base_url(),
            token_url: default_token_url(),
            auth_url: default_auth_url(),
            scopes: default_scopes(),
            redirect_port: default_redirect_port(),
        }
    }
}

impl Default for RemindersSection {
    fn default() -> Self {
        Self {
            medication_lead_min: default_medication_lead_min(),
            appointment_lead_min: default_appointment_lead_min(),
            slot_cap: default_slot_cap(),
        }
    }
}

impl Config {
    fn path() -> Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk, writing the default file on first run.
    ///
    /// # Errors
    /// Returns an error if an existing file cannot be parsed, or if
    /// the default cannot be written.
    pub fn load() -> Result<Self> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path,
                    message: e.to_string(),
                })?;
                Ok(cfg)
            }
            Err(_) => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
        }
    }

    /// Load from disk, returning the default on any error.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    /// Persist to disk.
    pub fn save(&self) -> Result<()> {
        let path = Self::path()?;
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        std::fs::write(&path, content).map_err(|e| ConfigError::SaveFailed {
            path,
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Sync client settings drawn from the calendar section.
    pub fn calendar_config(&self) -> CalendarConfig {
        CalendarConfig {
            client_id: self.calendar.client_id.clone(),
            client_secret: self.calendar.client_secret.clone(),
            calendar_id: self.calendar.calendar_id.clone(),
            api_base_url: self.calendar.api_base_url.clone(),
            token_url: self.calendar.token_url.clone(),
        }
    }

    /// OAuth flow settings drawn from the calendar section.
    pub fn oauth_config(&self) -> OAuthConfig {
        OAuthConfig {
            client_id: self.calendar.client_id.clone(),
            client_secret: self.calendar.client_secret.clone(),
            auth_url: self.calendar.auth_url.clone(),
            token_url: self.calendar.token_url.clone(),
            scopes: self.calendar.scopes.clone(),
            redirect_port: self.calendar.redirect_port,
        }
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = json_lookup(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by dot-separated key and persist.
    ///
    /// # Errors
    /// Returns an error if the key is unknown, the value does not
    /// parse as the field's type, or saving fails.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut json = serde_json::to_value(&*self).map_err(crate::error::CoreError::Json)?;
        json_assign(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(crate::error::CoreError::Json)?;
        self.save()?;
        Ok(())
    }
}

fn json_lookup<'a>(root: &'a serde_json::Value, key: &str) -> Option<&'a serde_json::Value> {
    if key.is_empty() {
        return None;
    }
    key.split('.').try_fold(root, |node, part| node.get(part))
}

/// Replace the leaf at `key` with `value` coerced to the existing
/// field's JSON type.
fn json_assign(root: &mut serde_json::Value, key: &str, value: &str) -> Result<()> {
    let Some((parent_path, leaf)) = split_leaf(key) else {
        return Err(ConfigError::MissingKey(key.to_string()).into());
    };

    let parent = match parent_path {
        Some(path) => path
            .split('.')
            .try_fold(&mut *root, |node, part| node.get_mut(part))
            .ok_or_else(|| ConfigError::MissingKey(key.to_string()))?,
        None => root,
    };
    let obj = parent
        .as_object_mut()
        .ok_or_else(|| ConfigError::MissingKey(key.to_string()))?;
    let existing = obj
        .get(leaf)
        .ok_or_else(|| ConfigError::MissingKey(key.to_string()))?;

    let invalid = |message: String| ConfigError::InvalidValue {
        key: key.to_string(),
        message,
    };
    let new_value = match existing {
        serde_json::Value::Bool(_) => serde_json::Value::Bool(
            value
                .parse::<bool>()
                .map_err(|_| invalid(format!("cannot parse '{value}' as bool")))?,
        ),
        serde_json::Value::Number(_) => {
            if let Ok(n) = value.parse::<u64>() {
                serde_json::Value::Number(n.into())
            } else if let Ok(n) = value.parse::<f64>() {
                serde_json::Number::from_f64(n)
                    .map(serde_json::Value::Number)
                    .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?
            } else {
                return Err(invalid(format!("cannot parse '{value}' as number")).into());
            }
        }
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => serde_json::from_str(value)
            .map_err(|e| invalid(format!("cannot parse '{value}': {e}")))?,
        _ => serde_json::Value::String(value.to_string()),
    };

    obj.insert(leaf.to_string(), new_value);
    Ok(())
}

/// Split "a.b.c" into (Some("a.b"), "c"); a bare "c" has no parent.
fn split_leaf(key: &str) -> Option<(Option<&str>, &str)> {
    if key.is_empty() {
        return None;
    }
    match key.rsplit_once('.') {
        Some((parent, leaf)) if !leaf.is_empty() => Some((Some(parent), leaf)),
        Some(_) => None,
        None => Some((None, key)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, cfg);
        assert_eq!(parsed.calendar.calendar_id, "primary");
        assert_eq!(parsed.reminders.slot_cap, DEFAULT_SLOT_CAP);
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let cfg: Config = toml::from_str("[calendar]\nclient_id = \"cid\"\n").unwrap();
        assert_eq!(cfg.calendar.client_id, "cid");
        assert_eq!(cfg.calendar.token_url, default_token_url());
        assert_eq!(cfg.reminders.medication_lead_min, 10);
        assert_eq!(cfg.reminders.appointment_lead_min, 60);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("calendar.calendar_id").as_deref(), Some("primary"));
        assert_eq!(cfg.get("reminders.slot_cap").as_deref(), Some("5"));
        assert!(cfg.get("calendar.missing_key").is_none());
        assert!(cfg.get("").is_none());
    }

    #[test]
    fn assign_updates_number_and_string() {
        let mut json = serde_json::to_value(Config::default()).unwrap();
        json_assign(&mut json, "reminders.medication_lead_min", "30").unwrap();
        assert_eq!(
            json_lookup(&json, "reminders.medication_lead_min").unwrap(),
            &serde_json::Value::Number(30.into())
        );

        json_assign(&mut json, "calendar.client_id", "cid-123").unwrap();
        assert_eq!(
            json_lookup(&json, "calendar.client_id").unwrap(),
            &serde_json::Value::String("cid-123".to_string())
        );
    }

    #[test]
    fn assign_rejects_unknown_key_and_bad_type() {
        let mut json = serde_json::to_value(Config::default()).unwrap();
        assert!(json_assign(&mut json, "calendar.nonexistent", "x").is_err());
        assert!(json_assign(&mut json, "reminders.slot_cap", "many").is_err());
    }

    #[test]
    fn calendar_config_mirrors_section() {
        let mut cfg = Config::default();
        cfg.calendar.client_id = "cid".into();
        cfg.calendar.client_secret = "secret".into();
        let cc = cfg.calendar_config();
        assert_eq!(cc.client_id, "cid");
        assert_eq!(cc.calendar_id, "primary");
        assert_eq!(cc.token_url, default_token_url());
    }

    #[test]
    fn oauth_config_mirrors_section() {
        let cfg = Config::default();
        let oc = cfg.oauth_config();
        assert_eq!(oc.auth_url, default_auth_url());
        assert_eq!(oc.redirect_port, 8721);
        assert_eq!(oc.scopes.len(), 1);
    }
}
