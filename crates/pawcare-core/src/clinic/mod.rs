//! Clinic records: pets, prescriptions, and appointments.
//!
//! These are the rows the reminder expander and the calendar sync pass
//! read from; the store persists them and the CLI edits them.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::calendar::{EventCategory, EventDescriptor, EventStatus};
use crate::error::ValidationError;
use crate::reminders::MedicationCourse;
use crate::schedule::{ScheduleType, TimeSlots};

/// A patient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pet {
    pub id: String,
    pub name: String,
    pub species: String,
    #[serde(default)]
    pub breed: Option<String>,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
    /// Owner's display name.
    pub owner: String,
}

impl Pet {
    pub fn new(name: &str, species: &str, owner: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            species: species.to_string(),
            breed: None,
            birth_date: None,
            owner: owner.to_string(),
        }
    }
}

/// A medication course prescribed to one pet.
///
/// `frequency` is the free-form tag the prescribing form collected; it
/// resolves to a [`ScheduleType`] permissively, never erroring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prescription {
    pub id: String,
    pub pet_id: String,
    pub medication: String,
    pub dosage: String,
    #[serde(default)]
    pub instructions: String,
    pub frequency: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reminder_lead_min: u32,
    pub time_slots: TimeSlots,
    /// Remote reminder event ids created for this course.
    #[serde(default)]
    pub event_ids: Vec<String>,
}

impl Prescription {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        pet_id: &str,
        medication: &str,
        dosage: &str,
        frequency: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        reminder_lead_min: u32,
        time_slots: TimeSlots,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            pet_id: pet_id.to_string(),
            medication: medication.to_string(),
            dosage: dosage.to_string(),
            instructions: String::new(),
            frequency: frequency.to_string(),
            start_date,
            end_date,
            reminder_lead_min,
            time_slots,
            event_ids: Vec::new(),
        }
    }

    pub fn schedule_type(&self) -> ScheduleType {
        ScheduleType::from_frequency(&self.frequency)
    }

    /// Expander input for this prescription.
    pub fn course(&self, pet: &Pet) -> MedicationCourse {
        MedicationCourse {
            medication: self.medication.clone(),
            dosage: self.dosage.clone(),
            instructions: self.instructions.clone(),
            pet_name: pet.name.clone(),
            start_date: self.start_date,
            end_date: self.end_date,
            slots: self.time_slots.clone(),
            schedule: self.schedule_type(),
            reminder_lead_min: self.reminder_lead_min,
            custom_description: None,
        }
    }
}

/// Appointment lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Requested,
    Confirmed,
    Completed,
    Cancelled,
    NoShow,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Requested => "requested",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::NoShow => "no_show",
        }
    }

    /// Terminal states that no longer occupy the calendar.
    pub fn is_closed(&self) -> bool {
        matches!(
            self,
            AppointmentStatus::Completed | AppointmentStatus::Cancelled | AppointmentStatus::NoShow
        )
    }
}

impl FromStr for AppointmentStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "requested" => Ok(AppointmentStatus::Requested),
            "confirmed" => Ok(AppointmentStatus::Confirmed),
            "completed" => Ok(AppointmentStatus::Completed),
            "cancelled" => Ok(AppointmentStatus::Cancelled),
            "no_show" => Ok(AppointmentStatus::NoShow),
            other => Err(ValidationError::InvalidValue {
                field: "status".to_string(),
                message: format!("unknown appointment status '{other}'"),
            }),
        }
    }
}

/// A clinic visit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: String,
    pub pet_id: String,
    pub title: String,
    pub start: DateTime<Utc>,
    pub duration_min: u32,
    #[serde(default)]
    pub location: String,
    pub status: AppointmentStatus,
    /// Remote event id once synced.
    #[serde(default)]
    pub calendar_event_id: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Appointment {
    pub fn new(pet_id: &str, title: &str, start: DateTime<Utc>, duration_min: u32) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            pet_id: pet_id.to_string(),
            title: title.to_string(),
            start,
            duration_min,
            location: String::new(),
            status: AppointmentStatus::Requested,
            calendar_event_id: None,
            notes: None,
        }
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.start + Duration::minutes(i64::from(self.duration_min))
    }

    pub fn is_past(&self, now: DateTime<Utc>) -> bool {
        self.end() < now
    }

    /// Event descriptor for calendar sync.
    pub fn descriptor(&self, pet_name: &str, reminder_lead_min: u32) -> EventDescriptor {
        let status = if self.status == AppointmentStatus::Cancelled {
            EventStatus::Cancelled
        } else {
            EventStatus::Confirmed
        };
        let description = match &self.notes {
            Some(notes) => format!("{}\n\n{}", self.title, notes),
            None => self.title.clone(),
        };
        EventDescriptor {
            summary: format!("{}: {}", pet_name, self.title),
            description,
            location: self.location.clone(),
            start: self.start,
            end: self.end(),
            status,
            category: Some(EventCategory::Appointment),
            reminder_lead_min,
        }
    }
}

/// Dashboard grouping of a user's appointment list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppointmentBuckets {
    pub upcoming: Vec<Appointment>,
    pub past: Vec<Appointment>,
    pub cancelled: Vec<Appointment>,
}

impl AppointmentBuckets {
    /// Bucket by status first, then by clock position.
    ///
    /// Cancelled visits always land in their own bucket; completed and
    /// no-show visits count as past regardless of `now`.
    pub fn group(appointments: Vec<Appointment>, now: DateTime<Utc>) -> Self {
        let mut buckets = Self::default();
        for appt in appointments {
            if appt.status == AppointmentStatus::Cancelled {
                buckets.cancelled.push(appt);
            } else if appt.status.is_closed() || appt.is_past(now) {
                buckets.past.push(appt);
            } else {
                buckets.upcoming.push(appt);
            }
        }
        buckets
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::TimeSlot;
    use chrono::TimeZone;

    fn pet() -> Pet {
        Pet::new("Milo", "cat", "Sam")
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn prescription_resolves_frequency() {
        let mut slots = TimeSlots::new();
        slots.push(TimeSlot::new(8, 0).unwrap()).unwrap();
        let rx = Prescription::new(
            "pet-1",
            "Amoxicillin",
            "50mg",
            "every other day",
            date(2025, 3, 10),
            date(2025, 3, 20),
            10,
            slots,
        );
        assert_eq!(rx.schedule_type(), ScheduleType::EveryOtherDay);
    }

    #[test]
    fn course_carries_pet_name_and_schedule() {
        let mut slots = TimeSlots::new();
        slots.push(TimeSlot::new(8, 0).unwrap()).unwrap();
        let rx = Prescription::new(
            "pet-1",
            "Amoxicillin",
            "50mg",
            "daily",
            date(2025, 3, 10),
            date(2025, 3, 12),
            15,
            slots,
        );
        let course = rx.course(&pet());
        assert_eq!(course.pet_name, "Milo");
        assert_eq!(course.schedule, ScheduleType::Daily);
        assert_eq!(course.reminder_lead_min, 15);
        assert_eq!(course.slots.len(), 1);
    }

    #[test]
    fn status_round_trip() {
        for status in [
            AppointmentStatus::Requested,
            AppointmentStatus::Confirmed,
            AppointmentStatus::Completed,
            AppointmentStatus::Cancelled,
            AppointmentStatus::NoShow,
        ] {
            assert_eq!(status.as_str().parse::<AppointmentStatus>().unwrap(), status);
        }
        assert!("someday".parse::<AppointmentStatus>().is_err());
    }

    #[test]
    fn appointment_descriptor_maps_fields() {
        let start = Utc.with_ymd_and_hms(2025, 4, 1, 14, 30, 0).unwrap();
        let mut appt = Appointment::new("pet-1", "Annual checkup", start, 30);
        appt.location = "Main St Clinic".to_string();
        appt.status = AppointmentStatus::Confirmed;
        let desc = appt.descriptor("Milo", 60);
        assert_eq!(desc.summary, "Milo: Annual checkup");
        assert_eq!(desc.location, "Main St Clinic");
        assert_eq!(desc.end - desc.start, Duration::minutes(30));
        assert_eq!(desc.status, EventStatus::Confirmed);
        assert_eq!(desc.category, Some(EventCategory::Appointment));
        assert_eq!(desc.reminder_lead_min, 60);
    }

    #[test]
    fn cancelled_appointment_descriptor_is_cancelled() {
        let start = Utc.with_ymd_and_hms(2025, 4, 1, 14, 30, 0).unwrap();
        let mut appt = Appointment::new("pet-1", "Annual checkup", start, 30);
        appt.status = AppointmentStatus::Cancelled;
        assert_eq!(appt.descriptor("Milo", 60).status, EventStatus::Cancelled);
    }

    #[test]
    fn grouping_buckets_by_status_then_time() {
        let now = Utc.with_ymd_and_hms(2025, 4, 1, 12, 0, 0).unwrap();
        let mut past = Appointment::new("p", "Past", now - Duration::days(2), 30);
        past.status = AppointmentStatus::Completed;
        let upcoming = Appointment::new("p", "Soon", now + Duration::days(2), 30);
        let mut cancelled = Appointment::new("p", "Dropped", now + Duration::days(3), 30);
        cancelled.status = AppointmentStatus::Cancelled;
        // Confirmed but already over; goes to past by clock position.
        let over = Appointment::new("p", "Over", now - Duration::hours(3), 30);

        let buckets = AppointmentBuckets::group(vec![past, upcoming, cancelled, over], now);
        assert_eq!(buckets.past.len(), 2);
        assert_eq!(buckets.upcoming.len(), 1);
        assert_eq!(buckets.cancelled.len(), 1);
        assert_eq!(buckets.upcoming[0].title, "Soon");
        assert_eq!(buckets.cancelled[0].title, "Dropped");
    }
}
