//! Deterministic expansion of a medication course into calendar reminders.
//!
//! Pure date arithmetic, no I/O. The sync layer consumes the emitted
//! descriptors; nothing here talks to the provider.

use chrono::{Duration, NaiveDate};

use crate::calendar::{EventCategory, EventDescriptor, EventStatus, EVENT_DURATION_MIN};
use crate::schedule::{ScheduleType, TimeSlots};

/// Input to the reminder expander.
///
/// Built fresh per expansion call from a prescription and its pet, then
/// discarded. Carries no identity of its own.
#[derive(Debug, Clone, PartialEq)]
pub struct MedicationCourse {
    pub medication: String,
    pub dosage: String,
    pub instructions: String,
    pub pet_name: String,
    /// First dose-day, inclusive.
    pub start_date: NaiveDate,
    /// Last candidate dose-day, inclusive.
    pub end_date: NaiveDate,
    pub slots: TimeSlots,
    pub schedule: ScheduleType,
    pub reminder_lead_min: u32,
    pub custom_description: Option<String>,
}

impl MedicationCourse {
    /// Event summary line, e.g. `"Milo: Amoxicillin 50mg"`.
    pub fn summary(&self) -> String {
        format!("{}: {} {}", self.pet_name, self.medication, self.dosage)
    }

    /// Caller-supplied description, or the synthesized default.
    pub fn description(&self) -> String {
        match &self.custom_description {
            Some(text) => text.clone(),
            None => format!(
                "{} {}\n{}\n\nPrescribed for {}",
                self.medication, self.dosage, self.instructions, self.pet_name
            ),
        }
    }
}

/// Expand a course into one descriptor per enabled slot per dose-day.
///
/// The day window `[start_date, end_date]` is inclusive and stepped by
/// the schedule's interval; slot hour/minute are applied to each
/// retained day in UTC and every event runs exactly
/// [`EVENT_DURATION_MIN`] minutes. As-needed courses and inverted
/// windows expand to nothing (degenerate input, not an error). Output
/// order is chronological by day, then slot insertion order.
pub fn expand_course(course: &MedicationCourse) -> Vec<EventDescriptor> {
    let Some(interval) = course.schedule.interval_days() else {
        return Vec::new();
    };

    let total_days = (course.end_date - course.start_date).num_days() + 1;
    if total_days <= 0 {
        return Vec::new();
    }

    let description = course.description();
    let summary = course.summary();
    let mut events = Vec::new();

    let mut day = 0i64;
    while day < total_days {
        let current = course.start_date + Duration::days(day);
        if current > course.end_date {
            // Interval overshoot near the window boundary.
            break;
        }
        for slot in course.slots.enabled() {
            let start = match current.and_hms_opt(slot.hour.into(), slot.minute.into(), 0) {
                Some(dt) => dt.and_utc(),
                // Slots are validated at construction; skip anything that
                // arrived out of range through raw deserialization.
                None => continue,
            };
            events.push(EventDescriptor {
                summary: summary.clone(),
                description: description.clone(),
                location: String::new(),
                start,
                end: start + Duration::minutes(EVENT_DURATION_MIN),
                status: EventStatus::Confirmed,
                category: Some(EventCategory::Medication),
                reminder_lead_min: course.reminder_lead_min,
            });
        }
        day += i64::from(interval);
    }

    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::TimeSlot;

    fn course(schedule: ScheduleType, start: NaiveDate, end: NaiveDate) -> MedicationCourse {
        let mut slots = TimeSlots::new();
        slots.push(TimeSlot::new(9, 0).unwrap()).unwrap();
        MedicationCourse {
            medication: "Amoxicillin".to_string(),
            dosage: "50mg".to_string(),
            instructions: "With food".to_string(),
            pet_name: "Milo".to_string(),
            start_date: start,
            end_date: end,
            slots,
            schedule,
            reminder_lead_min: 10,
            custom_description: None,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn daily_emits_every_day() {
        let events = expand_course(&course(
            ScheduleType::Daily,
            date(2025, 3, 10),
            date(2025, 3, 14),
        ));
        assert_eq!(events.len(), 5);
        assert_eq!(events[0].start.date_naive(), date(2025, 3, 10));
        assert_eq!(events[4].start.date_naive(), date(2025, 3, 14));
    }

    #[test]
    fn every_other_day_steps_by_two() {
        let events = expand_course(&course(
            ScheduleType::EveryOtherDay,
            date(2025, 3, 10),
            date(2025, 3, 14),
        ));
        let days: Vec<NaiveDate> = events.iter().map(|e| e.start.date_naive()).collect();
        assert_eq!(
            days,
            vec![date(2025, 3, 10), date(2025, 3, 12), date(2025, 3, 14)]
        );
    }

    #[test]
    fn weekly_ten_day_window_hits_days_zero_and_seven() {
        let events = expand_course(&course(
            ScheduleType::Weekly,
            date(2025, 3, 10),
            date(2025, 3, 19),
        ));
        let days: Vec<NaiveDate> = events.iter().map(|e| e.start.date_naive()).collect();
        assert_eq!(days, vec![date(2025, 3, 10), date(2025, 3, 17)]);
    }

    #[test]
    fn event_count_is_days_times_enabled_slots() {
        let mut c = course(ScheduleType::Daily, date(2025, 3, 10), date(2025, 3, 12));
        c.slots.push(TimeSlot::new(21, 30).unwrap()).unwrap();
        let events = expand_course(&c);
        // 3 days x 2 enabled slots.
        assert_eq!(events.len(), 6);
    }

    #[test]
    fn inverted_window_is_empty_not_an_error() {
        let events = expand_course(&course(
            ScheduleType::Daily,
            date(2025, 3, 14),
            date(2025, 3, 10),
        ));
        assert!(events.is_empty());
    }

    #[test]
    fn empty_slot_list_emits_nothing() {
        let mut c = course(ScheduleType::Daily, date(2025, 3, 10), date(2025, 3, 14));
        c.slots = TimeSlots::new();
        assert!(expand_course(&c).is_empty());
    }

    #[test]
    fn duplicate_slots_emit_duplicates() {
        let mut c = course(ScheduleType::Daily, date(2025, 3, 10), date(2025, 3, 10));
        c.slots.push(TimeSlot::new(9, 0).unwrap()).unwrap();
        let events = expand_course(&c);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].start, events[1].start);
    }

    #[test]
    fn synthesized_description_and_summary() {
        let events = expand_course(&course(
            ScheduleType::Daily,
            date(2025, 3, 10),
            date(2025, 3, 10),
        ));
        assert_eq!(events[0].summary, "Milo: Amoxicillin 50mg");
        assert_eq!(
            events[0].description,
            "Amoxicillin 50mg\nWith food\n\nPrescribed for Milo"
        );
        assert_eq!(events[0].location, "");
    }

    #[test]
    fn custom_description_wins() {
        let mut c = course(ScheduleType::Daily, date(2025, 3, 10), date(2025, 3, 10));
        c.custom_description = Some("Give with breakfast".to_string());
        let events = expand_course(&c);
        assert_eq!(events[0].description, "Give with breakfast");
    }

    #[test]
    fn chronological_then_slot_order() {
        let mut c = course(ScheduleType::Daily, date(2025, 3, 10), date(2025, 3, 11));
        c.slots.push(TimeSlot::new(8, 0).unwrap()).unwrap();
        let events = expand_course(&c);
        // Day order first, then the slots in insertion order (09:00, 08:00).
        let starts: Vec<(NaiveDate, u8)> = events
            .iter()
            .map(|e| {
                (
                    e.start.date_naive(),
                    e.start.time().format("%H").to_string().parse().unwrap(),
                )
            })
            .collect();
        assert_eq!(
            starts,
            vec![
                (date(2025, 3, 10), 9),
                (date(2025, 3, 10), 8),
                (date(2025, 3, 11), 9),
                (date(2025, 3, 11), 8),
            ]
        );
    }

    #[test]
    fn medication_category_and_confirmed_status() {
        let events = expand_course(&course(
            ScheduleType::Daily,
            date(2025, 3, 10),
            date(2025, 3, 10),
        ));
        assert_eq!(events[0].category, Some(EventCategory::Medication));
        assert_eq!(events[0].status, EventStatus::Confirmed);
        assert_eq!(events[0].reminder_lead_min, 10);
    }
}
