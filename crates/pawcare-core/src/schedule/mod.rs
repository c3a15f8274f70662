//! Medication schedule primitives: recurrence class and dosing time slots.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::ValidationError;

/// Default maximum number of dose times per schedule.
pub const DEFAULT_SLOT_CAP: usize = 5;

/// Recurrence class of a medication course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleType {
    Daily,
    EveryOtherDay,
    Weekly,
    /// No dosing cadence; reminder generation is suppressed entirely.
    AsNeeded,
}

impl ScheduleType {
    /// Resolve a free-form frequency tag from a prescription row.
    ///
    /// Frequency strings come from forms and imports with no controlled
    /// vocabulary, so unrecognized input falls back to daily dosing
    /// rather than erroring.
    pub fn from_frequency(freq: &str) -> Self {
        let tag = freq.trim().to_ascii_lowercase();
        if tag.contains("as needed") || tag.contains("as_needed") || tag.contains("prn") {
            ScheduleType::AsNeeded
        } else if tag.contains("every other") || tag.contains("every_other") || tag.contains("alternat")
        {
            ScheduleType::EveryOtherDay
        } else if tag.contains("week") {
            ScheduleType::Weekly
        } else {
            ScheduleType::Daily
        }
    }

    /// Days between dose-days, or `None` for as-needed schedules.
    pub fn interval_days(&self) -> Option<u32> {
        match self {
            ScheduleType::Daily => Some(1),
            ScheduleType::EveryOtherDay => Some(2),
            ScheduleType::Weekly => Some(7),
            ScheduleType::AsNeeded => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScheduleType::Daily => "daily",
            ScheduleType::EveryOtherDay => "every_other_day",
            ScheduleType::Weekly => "weekly",
            ScheduleType::AsNeeded => "as_needed",
        }
    }
}

/// One intended dosing time within a day.
///
/// Minutes are restricted to quarter-hour boundaries to match the
/// slot picker in the schedule editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeSlot {
    pub hour: u8,
    pub minute: u8,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl TimeSlot {
    pub const VALID_MINUTES: [u8; 4] = [0, 15, 30, 45];

    /// Validating constructor. New slots start out enabled.
    pub fn new(hour: u8, minute: u8) -> Result<Self, ValidationError> {
        if hour > 23 {
            return Err(ValidationError::SlotHourOutOfRange(hour));
        }
        if !Self::VALID_MINUTES.contains(&minute) {
            return Err(ValidationError::SlotMinuteOffQuarter(minute));
        }
        Ok(Self {
            hour,
            minute,
            enabled: true,
        })
    }

    /// A valid slot that is switched off (kept in the set, emits nothing).
    pub fn disabled(hour: u8, minute: u8) -> Result<Self, ValidationError> {
        let mut slot = Self::new(hour, minute)?;
        slot.enabled = false;
        Ok(slot)
    }

    /// "HH:MM" display form.
    pub fn label(&self) -> String {
        format!("{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for TimeSlot {
    type Err = ValidationError;

    /// Parse "HH:MM" as an enabled slot.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::InvalidValue {
            field: "time_slot".to_string(),
            message: format!("expected HH:MM, got '{s}'"),
        };
        let (h, m) = s.split_once(':').ok_or_else(invalid)?;
        let hour: u8 = h.trim().parse().map_err(|_| invalid())?;
        let minute: u8 = m.trim().parse().map_err(|_| invalid())?;
        Self::new(hour, minute)
    }
}

/// Dose times for one schedule: insertion-ordered, capped, no dedup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlots {
    slots: Vec<TimeSlot>,
    #[serde(default = "default_slot_cap")]
    cap: usize,
}

fn default_slot_cap() -> usize {
    DEFAULT_SLOT_CAP
}

impl TimeSlots {
    pub fn new() -> Self {
        Self::with_cap(DEFAULT_SLOT_CAP)
    }

    /// Empty set with a caller-chosen cap (from configuration).
    pub fn with_cap(cap: usize) -> Self {
        Self {
            slots: Vec::new(),
            cap,
        }
    }

    /// Append a slot, rejecting the push once the cap is reached.
    pub fn push(&mut self, slot: TimeSlot) -> Result<(), ValidationError> {
        if self.slots.len() >= self.cap {
            return Err(ValidationError::TooManySlots { max: self.cap });
        }
        self.slots.push(slot);
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &TimeSlot> {
        self.slots.iter()
    }

    /// Slots that actually emit reminders.
    pub fn enabled(&self) -> impl Iterator<Item = &TimeSlot> {
        self.slots.iter().filter(|s| s.enabled)
    }

    pub fn enabled_count(&self) -> usize {
        self.enabled().count()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn cap(&self) -> usize {
        self.cap
    }
}

impl Default for TimeSlots {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> IntoIterator for &'a TimeSlots {
    type Item = &'a TimeSlot;
    type IntoIter = std::slice::Iter<'a, TimeSlot>;

    fn into_iter(self) -> Self::IntoIter {
        self.slots.iter()
    }
}
