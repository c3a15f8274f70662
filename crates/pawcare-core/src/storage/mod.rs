pub mod clinic_db;
mod config;

pub use clinic_db::ClinicDb;
pub use config::{CalendarSection, Config, RemindersSection};

use std::path::PathBuf;

use crate::error::Result;

/// Returns `~/.config/pawcare[-dev]/` based on PAWCARE_ENV.
///
/// Set PAWCARE_ENV=dev to use a separate development data directory.
///
/// # Errors
/// Returns an error if the config directory cannot be created.
pub fn data_dir() -> Result<PathBuf> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("PAWCARE_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("pawcare-dev")
    } else {
        base_dir.join("pawcare")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
