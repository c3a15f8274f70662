//! In-app notifications and their icon mapping.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Notification category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Appointment,
    Vaccination,
    Medication,
    ForumReply,
    HealthAlert,
    System,
}

impl NotificationKind {
    /// Icon name rendered next to the notification.
    pub fn icon(&self) -> &'static str {
        match self {
            NotificationKind::Appointment => "calendar",
            NotificationKind::Vaccination => "syringe",
            NotificationKind::Medication => "pill",
            NotificationKind::ForumReply => "message-circle",
            NotificationKind::HealthAlert => "alert-triangle",
            NotificationKind::System => "bell",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Appointment => "appointment",
            NotificationKind::Vaccination => "vaccination",
            NotificationKind::Medication => "medication",
            NotificationKind::ForumReply => "forum_reply",
            NotificationKind::HealthAlert => "health_alert",
            NotificationKind::System => "system",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "appointment" => Some(NotificationKind::Appointment),
            "vaccination" => Some(NotificationKind::Vaccination),
            "medication" => Some(NotificationKind::Medication),
            "forum_reply" => Some(NotificationKind::ForumReply),
            "health_alert" => Some(NotificationKind::HealthAlert),
            "system" => Some(NotificationKind::System),
            _ => None,
        }
    }
}

/// One notification row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub kind: NotificationKind,
    pub title: String,
    #[serde(default)]
    pub body: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub read: bool,
}

impl Notification {
    pub fn new(kind: NotificationKind, title: &str, body: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            kind,
            title: title.to_string(),
            body: body.to_string(),
            created_at: Utc::now(),
            read: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn icons_cover_every_kind() {
        let kinds = [
            NotificationKind::Appointment,
            NotificationKind::Vaccination,
            NotificationKind::Medication,
            NotificationKind::ForumReply,
            NotificationKind::HealthAlert,
            NotificationKind::System,
        ];
        for kind in kinds {
            assert!(!kind.icon().is_empty());
        }
        assert_eq!(NotificationKind::Medication.icon(), "pill");
        assert_eq!(NotificationKind::Appointment.icon(), "calendar");
    }

    #[test]
    fn kind_tag_round_trip() {
        for kind in [
            NotificationKind::Appointment,
            NotificationKind::Vaccination,
            NotificationKind::Medication,
            NotificationKind::ForumReply,
            NotificationKind::HealthAlert,
            NotificationKind::System,
        ] {
            assert_eq!(NotificationKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(NotificationKind::parse("mystery"), None);
    }

    #[test]
    fn new_notification_starts_unread() {
        let n = Notification::new(NotificationKind::System, "Sync finished", "2 synced");
        assert!(!n.read);
        assert_eq!(n.kind, NotificationKind::System);
    }
}
