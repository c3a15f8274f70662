use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

mod commands;

#[derive(Parser)]
#[command(name = "pawcare", version, about = "PawCare CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pet records
    Pet {
        #[command(subcommand)]
        action: commands::pet::PetAction,
    },
    /// Prescriptions and medication reminders
    Prescription {
        #[command(subcommand)]
        action: commands::prescription::PrescriptionAction,
    },
    /// Clinic appointments
    Appointment {
        #[command(subcommand)]
        action: commands::appointment::AppointmentAction,
    },
    /// Push appointments and reminders to the external calendar
    Sync {
        #[command(subcommand)]
        action: commands::sync::SyncAction,
    },
    /// Calendar provider authentication
    Auth {
        #[command(subcommand)]
        action: commands::auth::AuthAction,
    },
    /// Notification inbox
    Notify {
        #[command(subcommand)]
        action: commands::notify::NotifyAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Generate shell completions
    Completions {
        /// Target shell
        shell: Shell,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Pet { action } => commands::pet::run(action),
        Commands::Prescription { action } => commands::prescription::run(action),
        Commands::Appointment { action } => commands::appointment::run(action),
        Commands::Sync { action } => commands::sync::run(action),
        Commands::Auth { action } => commands::auth::run(action),
        Commands::Notify { action } => commands::notify::run(action),
        Commands::Config { action } => commands::config::run(action),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "pawcare", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
