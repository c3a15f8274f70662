use chrono::{DateTime, Utc};
use clap::Subcommand;
use pawcare_core::clinic::AppointmentBuckets;
use pawcare_core::{Appointment, AppointmentStatus, ClinicDb};

#[derive(Subcommand)]
pub enum AppointmentAction {
    /// Book an appointment
    Add {
        /// Pet id
        pet_id: String,
        /// Visit title, e.g. "Annual checkup"
        title: String,
        /// Start time, RFC 3339 (e.g. 2025-09-01T14:30:00Z)
        #[arg(long)]
        start: String,
        /// Duration in minutes
        #[arg(long, default_value = "30")]
        duration: u32,
        /// Clinic location
        #[arg(long, default_value = "")]
        location: String,
        /// Free-form notes
        #[arg(long)]
        notes: Option<String>,
    },
    /// List appointments grouped into upcoming / past / cancelled
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one appointment as JSON
    Show {
        /// Appointment id
        id: String,
    },
    /// Change an appointment's status
    Status {
        /// Appointment id
        id: String,
        /// One of: requested, confirmed, completed, cancelled, no_show
        status: String,
    },
}

pub fn run(action: AppointmentAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = ClinicDb::open()?;
    match action {
        AppointmentAction::Add {
            pet_id,
            title,
            start,
            duration,
            location,
            notes,
        } => {
            if db.get_pet(&pet_id)?.is_none() {
                eprintln!("no such pet: {pet_id}");
                std::process::exit(1);
            }
            let start: DateTime<Utc> = DateTime::parse_from_rfc3339(&start)?.with_timezone(&Utc);
            let mut appt = Appointment::new(&pet_id, &title, start, duration);
            appt.location = location;
            appt.notes = notes;
            db.insert_appointment(&appt)?;
            println!("appointment booked: {}", appt.id);
        }
        AppointmentAction::List { json } => {
            let buckets = AppointmentBuckets::group(db.list_appointments()?, Utc::now());
            if json {
                println!("{}", serde_json::to_string_pretty(&buckets)?);
            } else {
                print_bucket("upcoming", &buckets.upcoming);
                print_bucket("past", &buckets.past);
                print_bucket("cancelled", &buckets.cancelled);
            }
        }
        AppointmentAction::Show { id } => match db.get_appointment(&id)? {
            Some(appt) => println!("{}", serde_json::to_string_pretty(&appt)?),
            None => {
                eprintln!("no such appointment: {id}");
                std::process::exit(1);
            }
        },
        AppointmentAction::Status { id, status } => {
            let status: AppointmentStatus = status.parse()?;
            let Some(mut appt) = db.get_appointment(&id)? else {
                eprintln!("no such appointment: {id}");
                std::process::exit(1);
            };
            appt.status = status;
            db.update_appointment(&appt)?;
            println!("status set to {}", status.as_str());
        }
    }
    Ok(())
}

fn print_bucket(label: &str, appointments: &[Appointment]) {
    if appointments.is_empty() {
        return;
    }
    println!("{label}:");
    for appt in appointments {
        let synced = if appt.calendar_event_id.is_some() {
            " [synced]"
        } else {
            ""
        };
        println!(
            "  {}  {}  {} ({}m, {}){}",
            appt.id,
            appt.start.format("%Y-%m-%d %H:%M"),
            appt.title,
            appt.duration_min,
            appt.status.as_str(),
            synced
        );
    }
}
