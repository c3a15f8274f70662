//! Calendar event descriptors produced by the reminder expander and
//! appointment sync, plus their provider-shaped JSON bodies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Fixed length of a generated reminder event, in minutes.
pub const EVENT_DURATION_MIN: i64 = 15;

/// Remote event lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Confirmed,
    Cancelled,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Confirmed => "confirmed",
            EventStatus::Cancelled => "cancelled",
        }
    }
}

/// Category tag that picks the provider's event color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    Medication,
    Appointment,
    Vaccination,
}

impl EventCategory {
    /// Color id in the provider's fixed palette.
    pub fn color_id(&self) -> &'static str {
        match self {
            EventCategory::Medication => "11",
            EventCategory::Appointment => "9",
            EventCategory::Vaccination => "10",
        }
    }
}

/// One calendar event, built in memory and not yet sent to the provider.
///
/// The remote event id returned on create is the only surviving
/// artifact; the owning record persists it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDescriptor {
    pub summary: String,
    pub description: String,
    /// Possibly empty; medication reminders carry no location.
    pub location: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub status: EventStatus,
    pub category: Option<EventCategory>,
    /// Minutes before `start` for the single popup reminder.
    pub reminder_lead_min: u32,
}

impl EventDescriptor {
    /// Provider-shaped JSON body for create and update calls.
    pub fn to_api_body(&self) -> Value {
        let mut body = json!({
            "summary": self.summary,
            "description": self.description,
            "location": self.location,
            "start": {"dateTime": self.start.to_rfc3339(), "timeZone": "UTC"},
            "end": {"dateTime": self.end.to_rfc3339(), "timeZone": "UTC"},
            "status": self.status.as_str(),
            "reminders": {
                "useDefault": false,
                "overrides": [
                    {"method": "popup", "minutes": self.reminder_lead_min}
                ]
            }
        });
        if let Some(category) = self.category {
            body["colorId"] = json!(category.color_id());
        }
        body
    }

    pub fn duration_min(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> EventDescriptor {
        EventDescriptor {
            summary: "Milo: Amoxicillin 50mg".to_string(),
            description: "Amoxicillin 50mg\nWith food\n\nPrescribed for Milo".to_string(),
            location: String::new(),
            start: Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2025, 3, 10, 9, 15, 0).unwrap(),
            status: EventStatus::Confirmed,
            category: Some(EventCategory::Medication),
            reminder_lead_min: 10,
        }
    }

    #[test]
    fn api_body_shape() {
        let body = sample().to_api_body();
        assert_eq!(body["summary"], "Milo: Amoxicillin 50mg");
        assert_eq!(body["status"], "confirmed");
        assert_eq!(body["colorId"], "11");
        assert_eq!(body["reminders"]["useDefault"], false);
        assert_eq!(body["reminders"]["overrides"][0]["method"], "popup");
        assert_eq!(body["reminders"]["overrides"][0]["minutes"], 10);
        assert_eq!(body["start"]["timeZone"], "UTC");
    }

    #[test]
    fn api_body_omits_color_without_category() {
        let mut event = sample();
        event.category = None;
        let body = event.to_api_body();
        assert!(body.get("colorId").is_none());
    }

    #[test]
    fn category_colors_are_distinct() {
        assert_ne!(
            EventCategory::Medication.color_id(),
            EventCategory::Appointment.color_id()
        );
        assert_ne!(
            EventCategory::Appointment.color_id(),
            EventCategory::Vaccination.color_id()
        );
    }

    #[test]
    fn duration_reflects_window() {
        assert_eq!(sample().duration_min(), 15);
    }
}
