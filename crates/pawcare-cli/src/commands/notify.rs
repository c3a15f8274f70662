use clap::Subcommand;
use pawcare_core::ClinicDb;

#[derive(Subcommand)]
pub enum NotifyAction {
    /// List notifications, newest first
    List {
        /// Only unread ones
        #[arg(long)]
        unread: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Mark a notification as read
    Read {
        /// Notification id
        id: String,
    },
}

pub fn run(action: NotifyAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = ClinicDb::open()?;
    match action {
        NotifyAction::List { unread, json } => {
            let notifications = db.list_notifications(unread)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&notifications)?);
            } else if notifications.is_empty() {
                println!("no notifications");
            } else {
                for n in notifications {
                    let marker = if n.read { ' ' } else { '*' };
                    println!(
                        "{marker} {}  [{}] {}: {}",
                        n.created_at.format("%Y-%m-%d %H:%M"),
                        n.kind.as_str(),
                        n.title,
                        n.body
                    );
                    println!("    id: {}", n.id);
                }
            }
        }
        NotifyAction::Read { id } => {
            if db.mark_notification_read(&id)? {
                println!("ok");
            } else {
                eprintln!("no such notification: {id}");
                std::process::exit(1);
            }
        }
    }
    Ok(())
}
