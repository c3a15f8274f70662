use clap::Subcommand;
use pawcare_core::{authorize, ClinicDb, Config};

use super::sync::TOKENS_SERVICE;

#[derive(Subcommand)]
pub enum AuthAction {
    /// Run the browser OAuth flow and store the tokens
    Login {
        /// OAuth client id (persisted to config)
        #[arg(long)]
        client_id: Option<String>,
        /// OAuth client secret (persisted to config)
        #[arg(long)]
        client_secret: Option<String>,
    },
    /// Drop the stored tokens
    Logout,
    /// Check authentication status
    Status,
}

pub fn run(action: AuthAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        AuthAction::Login {
            client_id,
            client_secret,
        } => {
            let mut config = Config::load_or_default();
            if let Some(cid) = client_id {
                config.calendar.client_id = cid;
            }
            if let Some(secret) = client_secret {
                config.calendar.client_secret = secret;
            }
            config.save()?;

            let runtime = tokio::runtime::Runtime::new()?;
            let tokens = runtime.block_on(authorize(&config.oauth_config()))?;

            let db = ClinicDb::open()?;
            db.save_tokens(TOKENS_SERVICE, &tokens)?;
            println!("calendar connected");
        }
        AuthAction::Logout => {
            let db = ClinicDb::open()?;
            if db.clear_tokens(TOKENS_SERVICE)? {
                println!("calendar disconnected");
            } else {
                println!("no stored tokens");
            }
        }
        AuthAction::Status => {
            let db = ClinicDb::open()?;
            match db.load_tokens(TOKENS_SERVICE)? {
                Some(_) => println!("authenticated"),
                None => println!("not authenticated"),
            }
        }
    }
    Ok(())
}
