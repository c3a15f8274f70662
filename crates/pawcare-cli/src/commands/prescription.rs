use chrono::NaiveDate;
use clap::Subcommand;
use pawcare_core::{expand_course, ClinicDb, Config, Prescription, TimeSlot, TimeSlots};

#[derive(Subcommand)]
pub enum PrescriptionAction {
    /// Create a prescription
    Add {
        /// Pet id
        pet_id: String,
        /// Medication name
        medication: String,
        /// Dosage, e.g. "50mg"
        #[arg(long)]
        dosage: String,
        /// Frequency: daily, every other day, weekly, as needed
        #[arg(long, default_value = "daily")]
        frequency: String,
        /// First dose day (YYYY-MM-DD)
        #[arg(long)]
        start: String,
        /// Last dose day (YYYY-MM-DD), inclusive
        #[arg(long)]
        end: String,
        /// Dose time as HH:MM on a quarter hour, repeatable
        #[arg(long = "at")]
        at: Vec<String>,
        /// Administration instructions
        #[arg(long, default_value = "")]
        instructions: String,
        /// Popup lead minutes (defaults from config)
        #[arg(long)]
        lead: Option<u32>,
    },
    /// List prescriptions
    List {
        /// Restrict to one pet
        #[arg(long)]
        pet: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one prescription as JSON
    Show {
        /// Prescription id
        id: String,
    },
    /// Print the reminder events a prescription expands to
    Preview {
        /// Prescription id
        id: String,
    },
    /// Delete a prescription
    Remove {
        /// Prescription id
        id: String,
    },
}

pub fn run(action: PrescriptionAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = ClinicDb::open()?;
    match action {
        PrescriptionAction::Add {
            pet_id,
            medication,
            dosage,
            frequency,
            start,
            end,
            at,
            instructions,
            lead,
        } => {
            if db.get_pet(&pet_id)?.is_none() {
                eprintln!("no such pet: {pet_id}");
                std::process::exit(1);
            }
            let config = Config::load_or_default();
            let mut slots = TimeSlots::with_cap(config.reminders.slot_cap);
            for time in &at {
                slots.push(time.parse::<TimeSlot>()?)?;
            }
            let mut rx = Prescription::new(
                &pet_id,
                &medication,
                &dosage,
                &frequency,
                start.parse::<NaiveDate>()?,
                end.parse::<NaiveDate>()?,
                lead.unwrap_or(config.reminders.medication_lead_min),
                slots,
            );
            rx.instructions = instructions;
            db.insert_prescription(&rx)?;
            println!("prescription created: {}", rx.id);
        }
        PrescriptionAction::List { pet, json } => {
            let rxs = db.list_prescriptions(pet.as_deref())?;
            if json {
                println!("{}", serde_json::to_string_pretty(&rxs)?);
            } else if rxs.is_empty() {
                println!("no prescriptions");
            } else {
                for rx in rxs {
                    println!(
                        "{}  {} {} ({}, {} to {})",
                        rx.id, rx.medication, rx.dosage, rx.frequency, rx.start_date, rx.end_date
                    );
                }
            }
        }
        PrescriptionAction::Show { id } => match db.get_prescription(&id)? {
            Some(rx) => println!("{}", serde_json::to_string_pretty(&rx)?),
            None => {
                eprintln!("no such prescription: {id}");
                std::process::exit(1);
            }
        },
        PrescriptionAction::Preview { id } => {
            let Some(rx) = db.get_prescription(&id)? else {
                eprintln!("no such prescription: {id}");
                std::process::exit(1);
            };
            let pet = db
                .get_pet(&rx.pet_id)?
                .ok_or("prescription references an unknown pet")?;
            let events = expand_course(&rx.course(&pet));
            println!("{} reminder events", events.len());
            for event in &events {
                println!("  {}  {}", event.start.format("%Y-%m-%d %H:%M"), event.summary);
            }
        }
        PrescriptionAction::Remove { id } => {
            if db.delete_prescription(&id)? {
                println!("removed");
            } else {
                eprintln!("no such prescription: {id}");
                std::process::exit(1);
            }
        }
    }
    Ok(())
}
