//! Best-effort bulk passes over clinic records.
//!
//! Each pass is a single sequential iteration within one request: no
//! batching, no parallel fan-out, and a failure for one item never
//! aborts the rest.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::{info, warn};

use crate::clinic::{Appointment, AppointmentStatus};
use crate::reminders::{expand_course, MedicationCourse};
use crate::sync::client::CalendarClient;
use crate::sync::types::SyncReport;

/// Outcome of publishing one medication course: the remote ids created
/// (for the owning prescription to persist) plus the per-descriptor
/// report.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PublishOutcome {
    pub event_ids: Vec<String>,
    pub report: SyncReport,
}

/// What one pass iteration will do with an appointment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Create,
    Update,
    Delete,
    Skip,
}

fn plan_action(appt: &Appointment, now: DateTime<Utc>) -> Action {
    if appt.status == AppointmentStatus::Cancelled {
        if appt.calendar_event_id.is_some() {
            Action::Delete
        } else {
            // Cancelled before it was ever synced.
            Action::Skip
        }
    } else if appt.status.is_closed() || appt.is_past(now) {
        Action::Skip
    } else if appt.calendar_event_id.is_some() {
        Action::Update
    } else {
        Action::Create
    }
}

/// Synchronize a user's appointment list with the remote calendar.
///
/// Creates events for unsynced upcoming visits, re-pushes already
/// synced ones, and deletes events of cancelled ones. Mutates
/// `calendar_event_id` in place as remote state changes; the caller
/// persists the records afterwards. `pet_names` maps pet id to
/// display name for event summaries.
pub async fn sync_appointments(
    client: &mut CalendarClient,
    appointments: &mut [Appointment],
    pet_names: &HashMap<String, String>,
    reminder_lead_min: u32,
    now: DateTime<Utc>,
) -> SyncReport {
    let mut report = SyncReport::default();

    for appt in appointments.iter_mut() {
        let pet_name = pet_names
            .get(&appt.pet_id)
            .map(String::as_str)
            .unwrap_or("Unknown pet");

        match plan_action(appt, now) {
            Action::Skip => report.skipped += 1,
            Action::Create => {
                let descriptor = appt.descriptor(pet_name, reminder_lead_min);
                match client.create_event(&descriptor).await {
                    Ok(event_id) => {
                        appt.calendar_event_id = Some(event_id);
                        report.synced += 1;
                    }
                    Err(e) => {
                        warn!(appointment = %appt.id, error = %e, "appointment create failed");
                        report.fail(&appt.id, e);
                    }
                }
            }
            Action::Update => {
                let descriptor = appt.descriptor(pet_name, reminder_lead_min);
                // Checked by plan_action.
                let Some(event_id) = appt.calendar_event_id.clone() else {
                    continue;
                };
                match client.update_event(&event_id, &descriptor).await {
                    Ok(()) => report.synced += 1,
                    Err(e) => {
                        warn!(appointment = %appt.id, error = %e, "appointment update failed");
                        report.fail(&appt.id, e);
                    }
                }
            }
            Action::Delete => {
                let Some(event_id) = appt.calendar_event_id.clone() else {
                    continue;
                };
                match client.delete_event(&event_id).await {
                    Ok(()) => {
                        appt.calendar_event_id = None;
                        report.synced += 1;
                    }
                    Err(e) => {
                        warn!(appointment = %appt.id, error = %e, "appointment delete failed");
                        report.fail(&appt.id, e);
                    }
                }
            }
        }
    }

    info!(
        synced = report.synced,
        skipped = report.skipped,
        failed = report.errors.len(),
        "appointment sync pass finished"
    );
    report
}

/// Expand a medication course and create one remote event per
/// descriptor. Returns every created id even when later descriptors
/// fail.
pub async fn publish_course(
    client: &mut CalendarClient,
    course: &MedicationCourse,
) -> PublishOutcome {
    let mut outcome = PublishOutcome::default();
    let descriptors = expand_course(course);
    if descriptors.is_empty() {
        info!(medication = %course.medication, "course expands to no reminders");
        return outcome;
    }

    for descriptor in &descriptors {
        match client.create_event(descriptor).await {
            Ok(event_id) => {
                outcome.event_ids.push(event_id);
                outcome.report.synced += 1;
            }
            Err(e) => {
                let item = format!("{} {}", course.medication, descriptor.start.to_rfc3339());
                warn!(item = %item, error = %e, "reminder create failed");
                outcome.report.fail(item, e);
            }
        }
    }

    info!(
        medication = %course.medication,
        created = outcome.event_ids.len(),
        failed = outcome.report.errors.len(),
        "course published"
    );
    outcome
}

/// Delete previously published reminder events, best-effort.
pub async fn retract_events(client: &mut CalendarClient, event_ids: &[String]) -> SyncReport {
    let mut report = SyncReport::default();
    for event_id in event_ids {
        match client.delete_event(event_id).await {
            Ok(()) => report.synced += 1,
            Err(e) => {
                warn!(event_id = %event_id, error = %e, "reminder delete failed");
                report.fail(event_id.clone(), e);
            }
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 4, 1, 12, 0, 0).unwrap()
    }

    fn upcoming() -> Appointment {
        Appointment::new("pet-1", "Checkup", now() + Duration::days(1), 30)
    }

    #[test]
    fn unsynced_upcoming_is_created() {
        assert_eq!(plan_action(&upcoming(), now()), Action::Create);
    }

    #[test]
    fn synced_upcoming_is_updated() {
        let mut appt = upcoming();
        appt.calendar_event_id = Some("ev-1".to_string());
        assert_eq!(plan_action(&appt, now()), Action::Update);
    }

    #[test]
    fn past_appointment_is_skipped() {
        let appt = Appointment::new("pet-1", "Old", now() - Duration::days(1), 30);
        assert_eq!(plan_action(&appt, now()), Action::Skip);
    }

    #[test]
    fn cancelled_synced_is_deleted() {
        let mut appt = upcoming();
        appt.status = AppointmentStatus::Cancelled;
        appt.calendar_event_id = Some("ev-1".to_string());
        assert_eq!(plan_action(&appt, now()), Action::Delete);
    }

    #[test]
    fn cancelled_never_synced_is_skipped() {
        let mut appt = upcoming();
        appt.status = AppointmentStatus::Cancelled;
        assert_eq!(plan_action(&appt, now()), Action::Skip);
    }

    #[test]
    fn closed_statuses_are_skipped_even_in_future() {
        let mut appt = upcoming();
        appt.status = AppointmentStatus::Completed;
        assert_eq!(plan_action(&appt, now()), Action::Skip);
        appt.status = AppointmentStatus::NoShow;
        assert_eq!(plan_action(&appt, now()), Action::Skip);
    }
}
