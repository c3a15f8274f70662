//! SQLite-backed clinic records store.
//!
//! Persists pets, prescriptions, appointments, notifications, OAuth
//! tokens, and a small key-value table for sync bookkeeping. Tokens
//! live here rather than in process memory: every sync operation
//! re-reads them and writes back whatever the client holds afterwards.

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection};
use std::path::PathBuf;

use super::data_dir;
use crate::clinic::{Appointment, AppointmentStatus, Pet, Prescription};
use crate::error::{DatabaseError, Result};
use crate::integrations::oauth::OAuthTokens;
use crate::notifications::{Notification, NotificationKind};
use crate::schedule::TimeSlots;

fn parse_status(s: &str) -> AppointmentStatus {
    s.parse().unwrap_or(AppointmentStatus::Requested)
}

fn parse_kind(s: &str) -> NotificationKind {
    NotificationKind::parse(s).unwrap_or(NotificationKind::System)
}

fn parse_date_fallback(s: &str) -> NaiveDate {
    s.parse().unwrap_or_else(|_| Utc::now().date_naive())
}

fn parse_datetime_fallback(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn row_to_pet(row: &rusqlite::Row) -> Result<Pet, rusqlite::Error> {
    let birth_date: Option<String> = row.get(4)?;
    Ok(Pet {
        id: row.get(0)?,
        name: row.get(1)?,
        species: row.get(2)?,
        breed: row.get(3)?,
        birth_date: birth_date.map(|d| parse_date_fallback(&d)),
        owner: row.get(5)?,
    })
}

fn row_to_prescription(row: &rusqlite::Row) -> Result<Prescription, rusqlite::Error> {
    let start: String = row.get(6)?;
    let end: String = row.get(7)?;
    let slots_json: String = row.get(9)?;
    let event_ids_json: String = row.get(10)?;
    Ok(Prescription {
        id: row.get(0)?,
        pet_id: row.get(1)?,
        medication: row.get(2)?,
        dosage: row.get(3)?,
        instructions: row.get(4)?,
        frequency: row.get(5)?,
        start_date: parse_date_fallback(&start),
        end_date: parse_date_fallback(&end),
        reminder_lead_min: row.get(8)?,
        time_slots: serde_json::from_str::<TimeSlots>(&slots_json).unwrap_or_default(),
        event_ids: serde_json::from_str(&event_ids_json).unwrap_or_default(),
    })
}

fn row_to_appointment(row: &rusqlite::Row) -> Result<Appointment, rusqlite::Error> {
    let start: String = row.get(3)?;
    let status: String = row.get(6)?;
    Ok(Appointment {
        id: row.get(0)?,
        pet_id: row.get(1)?,
        title: row.get(2)?,
        start: parse_datetime_fallback(&start),
        duration_min: row.get(4)?,
        location: row.get(5)?,
        status: parse_status(&status),
        calendar_event_id: row.get(7)?,
        notes: row.get(8)?,
    })
}

fn row_to_notification(row: &rusqlite::Row) -> Result<Notification, rusqlite::Error> {
    let kind: String = row.get(1)?;
    let created: String = row.get(4)?;
    Ok(Notification {
        id: row.get(0)?,
        kind: parse_kind(&kind),
        title: row.get(2)?,
        body: row.get(3)?,
        created_at: parse_datetime_fallback(&created),
        read: row.get(5)?,
    })
}

/// SQLite database for clinic records.
pub struct ClinicDb {
    conn: Connection,
}

impl ClinicDb {
    /// Open the database at `~/.config/pawcare/clinic.db`.
    ///
    /// Creates the file and schema on first use.
    pub fn open() -> Result<Self> {
        Self::open_at(data_dir()?.join("clinic.db"))
    }

    /// Open (or create) a database at an explicit path.
    pub fn open_at(path: PathBuf) -> Result<Self> {
        let conn =
            Connection::open(&path).map_err(|source| DatabaseError::OpenFailed { path, source })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    #[cfg(test)]
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(DatabaseError::from)?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS pets (
                    id         TEXT PRIMARY KEY,
                    name       TEXT NOT NULL,
                    species    TEXT NOT NULL,
                    breed      TEXT,
                    birth_date TEXT,
                    owner      TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS prescriptions (
                    id                TEXT PRIMARY KEY,
                    pet_id            TEXT NOT NULL,
                    medication        TEXT NOT NULL,
                    dosage            TEXT NOT NULL,
                    instructions      TEXT NOT NULL DEFAULT '',
                    frequency         TEXT NOT NULL,
                    start_date        TEXT NOT NULL,
                    end_date          TEXT NOT NULL,
                    reminder_lead_min INTEGER NOT NULL,
                    time_slots        TEXT NOT NULL DEFAULT '{}',
                    event_ids         TEXT NOT NULL DEFAULT '[]'
                );

                CREATE TABLE IF NOT EXISTS appointments (
                    id                TEXT PRIMARY KEY,
                    pet_id            TEXT NOT NULL,
                    title             TEXT NOT NULL,
                    start_at          TEXT NOT NULL,
                    duration_min      INTEGER NOT NULL,
                    location          TEXT NOT NULL DEFAULT '',
                    status            TEXT NOT NULL DEFAULT 'requested',
                    calendar_event_id TEXT,
                    notes             TEXT
                );

                CREATE TABLE IF NOT EXISTS notifications (
                    id         TEXT PRIMARY KEY,
                    kind       TEXT NOT NULL,
                    title      TEXT NOT NULL,
                    body       TEXT NOT NULL DEFAULT '',
                    created_at TEXT NOT NULL,
                    read       INTEGER NOT NULL DEFAULT 0
                );

                CREATE TABLE IF NOT EXISTS oauth_tokens (
                    service TEXT PRIMARY KEY,
                    tokens  TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS kv (
                    key   TEXT PRIMARY KEY,
                    value TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_prescriptions_pet ON prescriptions(pet_id);
                CREATE INDEX IF NOT EXISTS idx_appointments_pet ON appointments(pet_id);
                CREATE INDEX IF NOT EXISTS idx_appointments_start ON appointments(start_at);",
            )
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(())
    }

    // ── Pets ──

    pub fn insert_pet(&self, pet: &Pet) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO pets (id, name, species, breed, birth_date, owner)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                pet.id,
                pet.name,
                pet.species,
                pet.breed,
                pet.birth_date.map(|d| d.to_string()),
                pet.owner,
            ],
        )?;
        Ok(())
    }

    pub fn get_pet(&self, id: &str) -> Result<Option<Pet>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, species, breed, birth_date, owner FROM pets WHERE id = ?1",
        )?;
        match stmt.query_row(params![id], row_to_pet) {
            Ok(pet) => Ok(Some(pet)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn list_pets(&self) -> Result<Vec<Pet>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, species, breed, birth_date, owner FROM pets ORDER BY name")?;
        let pets = stmt
            .query_map([], row_to_pet)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(pets)
    }

    pub fn delete_pet(&self, id: &str) -> Result<bool> {
        let n = self
            .conn
            .execute("DELETE FROM pets WHERE id = ?1", params![id])?;
        Ok(n > 0)
    }

    // ── Prescriptions ──

    pub fn insert_prescription(&self, rx: &Prescription) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO prescriptions
             (id, pet_id, medication, dosage, instructions, frequency,
              start_date, end_date, reminder_lead_min, time_slots, event_ids)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                rx.id,
                rx.pet_id,
                rx.medication,
                rx.dosage,
                rx.instructions,
                rx.frequency,
                rx.start_date.to_string(),
                rx.end_date.to_string(),
                rx.reminder_lead_min,
                serde_json::to_string(&rx.time_slots)?,
                serde_json::to_string(&rx.event_ids)?,
            ],
        )?;
        Ok(())
    }

    pub fn get_prescription(&self, id: &str) -> Result<Option<Prescription>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, pet_id, medication, dosage, instructions, frequency,
                    start_date, end_date, reminder_lead_min, time_slots, event_ids
             FROM prescriptions WHERE id = ?1",
        )?;
        match stmt.query_row(params![id], row_to_prescription) {
            Ok(rx) => Ok(Some(rx)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn list_prescriptions(&self, pet_id: Option<&str>) -> Result<Vec<Prescription>> {
        let base = "SELECT id, pet_id, medication, dosage, instructions, frequency,
                    start_date, end_date, reminder_lead_min, time_slots, event_ids
             FROM prescriptions";
        let rxs = if let Some(pet_id) = pet_id {
            let mut stmt = self
                .conn
                .prepare(&format!("{base} WHERE pet_id = ?1 ORDER BY start_date"))?;
            let rows = stmt.query_map(params![pet_id], row_to_prescription)?;
            rows.collect::<Result<Vec<_>, _>>()?
        } else {
            let mut stmt = self.conn.prepare(&format!("{base} ORDER BY start_date"))?;
            let rows = stmt.query_map([], row_to_prescription)?;
            rows.collect::<Result<Vec<_>, _>>()?
        };
        Ok(rxs)
    }

    /// Persist the remote event ids created for a prescription's course.
    pub fn set_prescription_events(&self, id: &str, event_ids: &[String]) -> Result<()> {
        let n = self.conn.execute(
            "UPDATE prescriptions SET event_ids = ?2 WHERE id = ?1",
            params![id, serde_json::to_string(event_ids)?],
        )?;
        if n == 0 {
            return Err(DatabaseError::NotFound {
                entity: "prescription",
                id: id.to_string(),
            }
            .into());
        }
        Ok(())
    }

    pub fn delete_prescription(&self, id: &str) -> Result<bool> {
        let n = self
            .conn
            .execute("DELETE FROM prescriptions WHERE id = ?1", params![id])?;
        Ok(n > 0)
    }

    // ── Appointments ──

    pub fn insert_appointment(&self, appt: &Appointment) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO appointments
             (id, pet_id, title, start_at, duration_min, location, status, calendar_event_id, notes)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                appt.id,
                appt.pet_id,
                appt.title,
                appt.start.to_rfc3339(),
                appt.duration_min,
                appt.location,
                appt.status.as_str(),
                appt.calendar_event_id,
                appt.notes,
            ],
        )?;
        Ok(())
    }

    pub fn get_appointment(&self, id: &str) -> Result<Option<Appointment>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, pet_id, title, start_at, duration_min, location, status, calendar_event_id, notes
             FROM appointments WHERE id = ?1",
        )?;
        match stmt.query_row(params![id], row_to_appointment) {
            Ok(appt) => Ok(Some(appt)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn list_appointments(&self) -> Result<Vec<Appointment>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, pet_id, title, start_at, duration_min, location, status, calendar_event_id, notes
             FROM appointments ORDER BY start_at",
        )?;
        let appts = stmt
            .query_map([], row_to_appointment)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(appts)
    }

    /// Write back one appointment after a status change or sync pass.
    pub fn update_appointment(&self, appt: &Appointment) -> Result<()> {
        let n = self.conn.execute(
            "UPDATE appointments
             SET pet_id = ?2, title = ?3, start_at = ?4, duration_min = ?5,
                 location = ?6, status = ?7, calendar_event_id = ?8, notes = ?9
             WHERE id = ?1",
            params![
                appt.id,
                appt.pet_id,
                appt.title,
                appt.start.to_rfc3339(),
                appt.duration_min,
                appt.location,
                appt.status.as_str(),
                appt.calendar_event_id,
                appt.notes,
            ],
        )?;
        if n == 0 {
            return Err(DatabaseError::NotFound {
                entity: "appointment",
                id: appt.id.clone(),
            }
            .into());
        }
        Ok(())
    }

    pub fn delete_appointment(&self, id: &str) -> Result<bool> {
        let n = self
            .conn
            .execute("DELETE FROM appointments WHERE id = ?1", params![id])?;
        Ok(n > 0)
    }

    // ── Notifications ──

    pub fn insert_notification(&self, n: &Notification) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO notifications (id, kind, title, body, created_at, read)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                n.id,
                n.kind.as_str(),
                n.title,
                n.body,
                n.created_at.to_rfc3339(),
                n.read,
            ],
        )?;
        Ok(())
    }

    pub fn list_notifications(&self, unread_only: bool) -> Result<Vec<Notification>> {
        let base = "SELECT id, kind, title, body, created_at, read FROM notifications";
        let notifications = if unread_only {
            let mut stmt = self
                .conn
                .prepare(&format!("{base} WHERE read = 0 ORDER BY created_at DESC"))?;
            let rows = stmt.query_map([], row_to_notification)?;
            rows.collect::<Result<Vec<_>, _>>()?
        } else {
            let mut stmt = self
                .conn
                .prepare(&format!("{base} ORDER BY created_at DESC"))?;
            let rows = stmt.query_map([], row_to_notification)?;
            rows.collect::<Result<Vec<_>, _>>()?
        };
        Ok(notifications)
    }

    pub fn mark_notification_read(&self, id: &str) -> Result<bool> {
        let n = self.conn.execute(
            "UPDATE notifications SET read = 1 WHERE id = ?1",
            params![id],
        )?;
        Ok(n > 0)
    }

    // ── OAuth tokens ──

    pub fn save_tokens(&self, service: &str, tokens: &OAuthTokens) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO oauth_tokens (service, tokens) VALUES (?1, ?2)",
            params![service, serde_json::to_string(tokens)?],
        )?;
        Ok(())
    }

    pub fn load_tokens(&self, service: &str) -> Result<Option<OAuthTokens>> {
        let mut stmt = self
            .conn
            .prepare("SELECT tokens FROM oauth_tokens WHERE service = ?1")?;
        let json = match stmt.query_row(params![service], |row| row.get::<_, String>(0)) {
            Ok(v) => v,
            Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&json)?))
    }

    pub fn clear_tokens(&self, service: &str) -> Result<bool> {
        let n = self.conn.execute(
            "DELETE FROM oauth_tokens WHERE service = ?1",
            params![service],
        )?;
        Ok(n > 0)
    }

    // ── Key-value ──

    pub fn kv_get(&self, key: &str) -> Result<Option<String>> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        match stmt.query_row(params![key], |row| row.get::<_, String>(0)) {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn kv_set(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }
}
