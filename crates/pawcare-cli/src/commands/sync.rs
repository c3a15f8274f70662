//! Sync subcommands: push clinic records to the external calendar.
//!
//! Tokens live in the clinic database; every pass loads them, runs,
//! and writes back whatever the client holds afterwards so a mid-pass
//! refresh is never lost.

use clap::Subcommand;
use std::collections::HashMap;

use chrono::Utc;
use pawcare_core::sync::{
    publish_course, retract_events, sync_appointments, CalendarClient, TOKEN_EXPIRY_BUFFER_SECS,
};
use pawcare_core::{ClinicDb, Config, Notification, NotificationKind};

/// Row key for the stored calendar tokens.
pub const TOKENS_SERVICE: &str = "calendar";

#[derive(Subcommand)]
pub enum SyncAction {
    /// Push all appointments to the calendar
    Appointments,
    /// Publish a prescription's reminder events
    Course {
        /// Prescription id
        id: String,
    },
    /// Delete a prescription's published reminder events
    Retract {
        /// Prescription id
        id: String,
    },
    /// Show connection status
    Status,
}

pub fn run(action: SyncAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        SyncAction::Appointments => sync_appointments_cmd(),
        SyncAction::Course { id } => publish_course_cmd(&id),
        SyncAction::Retract { id } => retract_course_cmd(&id),
        SyncAction::Status => show_status(),
    }
}

fn client_from_store(
    config: &Config,
    db: &ClinicDb,
) -> Result<CalendarClient, Box<dyn std::error::Error>> {
    let tokens = db
        .load_tokens(TOKENS_SERVICE)?
        .ok_or("not connected to the calendar. Run 'pawcare auth login' first")?;
    Ok(CalendarClient::new(config.calendar_config(), tokens)?)
}

fn sync_appointments_cmd() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let db = ClinicDb::open()?;
    let mut client = client_from_store(&config, &db)?;

    let mut appointments = db.list_appointments()?;
    let pet_names: HashMap<String, String> = db
        .list_pets()?
        .into_iter()
        .map(|pet| (pet.id, pet.name))
        .collect();

    let runtime = tokio::runtime::Runtime::new()?;
    let report = runtime.block_on(sync_appointments(
        &mut client,
        &mut appointments,
        &pet_names,
        config.reminders.appointment_lead_min,
        Utc::now(),
    ));

    // Event ids changed during the pass; write every record back.
    for appt in &appointments {
        db.update_appointment(appt)?;
    }
    db.save_tokens(TOKENS_SERVICE, client.tokens())?;
    db.kv_set("last_sync_at", &Utc::now().to_rfc3339())?;

    println!(
        "synced: {}  skipped: {}  failed: {}",
        report.synced,
        report.skipped,
        report.errors.len()
    );
    for failure in &report.errors {
        eprintln!("  {}: {}", failure.item_id, failure.reason);
    }

    let note = Notification::new(
        NotificationKind::System,
        "Calendar sync finished",
        &format!("{} synced, {} failed", report.synced, report.errors.len()),
    );
    db.insert_notification(&note)?;
    Ok(())
}

fn publish_course_cmd(id: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let db = ClinicDb::open()?;
    let rx = db
        .get_prescription(id)?
        .ok_or_else(|| format!("no such prescription: {id}"))?;
    let pet = db
        .get_pet(&rx.pet_id)?
        .ok_or("prescription references an unknown pet")?;
    let mut client = client_from_store(&config, &db)?;

    let runtime = tokio::runtime::Runtime::new()?;
    let outcome = runtime.block_on(publish_course(&mut client, &rx.course(&pet)));

    if !outcome.event_ids.is_empty() {
        let mut event_ids = rx.event_ids.clone();
        event_ids.extend(outcome.event_ids.iter().cloned());
        db.set_prescription_events(id, &event_ids)?;
    }
    db.save_tokens(TOKENS_SERVICE, client.tokens())?;

    println!(
        "created {} reminder events ({} failed)",
        outcome.report.synced,
        outcome.report.errors.len()
    );
    for failure in &outcome.report.errors {
        eprintln!("  {}: {}", failure.item_id, failure.reason);
    }
    Ok(())
}

fn retract_course_cmd(id: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let db = ClinicDb::open()?;
    let rx = db
        .get_prescription(id)?
        .ok_or_else(|| format!("no such prescription: {id}"))?;
    if rx.event_ids.is_empty() {
        println!("no published events");
        return Ok(());
    }
    let mut client = client_from_store(&config, &db)?;

    let runtime = tokio::runtime::Runtime::new()?;
    let report = runtime.block_on(retract_events(&mut client, &rx.event_ids));

    // Keep only the ids whose delete failed, for a later retry.
    let remaining: Vec<String> = report
        .errors
        .iter()
        .map(|failure| failure.item_id.clone())
        .collect();
    db.set_prescription_events(id, &remaining)?;
    db.save_tokens(TOKENS_SERVICE, client.tokens())?;

    println!(
        "deleted {} events ({} failed)",
        report.synced,
        report.errors.len()
    );
    Ok(())
}

fn show_status() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let db = ClinicDb::open()?;

    if config.calendar.client_id.is_empty() {
        println!("credentials: not configured");
    } else {
        println!("credentials: configured");
    }
    match db.load_tokens(TOKENS_SERVICE)? {
        Some(tokens) if tokens.expires_within(TOKEN_EXPIRY_BUFFER_SECS) => {
            println!("connection: token expired (refreshes on next sync)");
        }
        Some(_) => println!("connection: authenticated"),
        None => println!("connection: not connected"),
    }
    if let Some(at) = db.kv_get("last_sync_at")? {
        println!("last sync: {at}");
    }
    Ok(())
}
