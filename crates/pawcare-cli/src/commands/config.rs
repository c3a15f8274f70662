use clap::Subcommand;
use pawcare_core::storage::data_dir;
use pawcare_core::Config;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print one value
    Get {
        /// Dot-path key, e.g. "calendar.calendar_id" or "reminders.slot_cap"
        key: String,
    },
    /// Change a value and persist it
    Set {
        /// Dot-path key
        key: String,
        /// New value
        value: String,
    },
    /// Dump the whole configuration (client secret redacted)
    List,
    /// Print the config file location
    Path,
    /// Reset to defaults, keeping the calendar credentials
    Reset,
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load_or_default();
            match config.get(&key) {
                Some(value) => println!("{value}"),
                None => {
                    eprintln!("unknown key: {key}");
                    std::process::exit(1);
                }
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load_or_default();
            config.set(&key, &value)?;
            match config.get(&key) {
                Some(stored) => println!("{key} = {stored}"),
                None => println!("ok"),
            }
        }
        ConfigAction::List => {
            let mut config = Config::load_or_default();
            if !config.calendar.client_secret.is_empty() {
                config.calendar.client_secret = "<redacted>".to_string();
            }
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        ConfigAction::Path => {
            println!("{}", data_dir()?.join("config.toml").display());
        }
        ConfigAction::Reset => {
            let current = Config::load_or_default();
            let mut config = Config::default();
            config.calendar.client_id = current.calendar.client_id;
            config.calendar.client_secret = current.calendar.client_secret;
            config.save()?;
            println!("config reset to defaults (credentials kept)");
        }
    }
    Ok(())
}
