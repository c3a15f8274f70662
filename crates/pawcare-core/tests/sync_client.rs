//! Integration tests for the calendar client and sync engine against a
//! mock provider server.

use chrono::{Duration, TimeZone, Utc};
use std::collections::HashMap;

use pawcare_core::sync::{
    publish_course, sync_appointments, CalendarClient, CalendarConfig, SyncError,
};
use pawcare_core::{
    Appointment, AppointmentStatus, EventCategory, EventDescriptor, EventStatus, MedicationCourse,
    OAuthTokens, ScheduleType, TimeSlot, TimeSlots,
};

fn config_for(url: &str) -> CalendarConfig {
    let mut config = CalendarConfig::new("cid", "secret");
    config.api_base_url = url.to_string();
    config.token_url = format!("{url}/token");
    config
}

fn fresh_tokens() -> OAuthTokens {
    OAuthTokens {
        access_token: "live-token".to_string(),
        refresh_token: Some("refresh-1".to_string()),
        expires_at: Some(Utc::now().timestamp() + 3600),
        token_type: "Bearer".to_string(),
        scope: None,
    }
}

fn expired_tokens() -> OAuthTokens {
    OAuthTokens {
        expires_at: Some(Utc::now().timestamp() - 10),
        ..fresh_tokens()
    }
}

fn descriptor() -> EventDescriptor {
    let start = Utc.with_ymd_and_hms(2025, 4, 10, 9, 0, 0).unwrap();
    EventDescriptor {
        summary: "Milo: Amoxicillin 50mg".to_string(),
        description: "Twice daily with food".to_string(),
        location: String::new(),
        start,
        end: start + Duration::minutes(15),
        status: EventStatus::Confirmed,
        category: Some(EventCategory::Medication),
        reminder_lead_min: 10,
    }
}

#[tokio::test]
async fn test_create_event_returns_remote_id() {
    let mut server = mockito::Server::new_async().await;
    let create = server
        .mock("POST", "/calendars/primary/events")
        .match_header("authorization", "Bearer live-token")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id": "evt-42", "status": "confirmed"}"#)
        .create_async()
        .await;

    let mut client = CalendarClient::new(config_for(&server.url()), fresh_tokens()).unwrap();
    let id = client.create_event(&descriptor()).await.unwrap();

    assert_eq!(id, "evt-42");
    create.assert_async().await;
}

#[tokio::test]
async fn test_fresh_token_skips_refresh_endpoint() {
    let mut server = mockito::Server::new_async().await;
    let token = server.mock("POST", "/token").expect(0).create_async().await;
    let create = server
        .mock("POST", "/calendars/primary/events")
        .with_status(200)
        .with_body(r#"{"id": "evt-1"}"#)
        .create_async()
        .await;

    let mut client = CalendarClient::new(config_for(&server.url()), fresh_tokens()).unwrap();
    client.create_event(&descriptor()).await.unwrap();

    token.assert_async().await;
    create.assert_async().await;
}

#[tokio::test]
async fn test_expired_token_refreshes_and_keeps_refresh_token() {
    let mut server = mockito::Server::new_async().await;
    let token = server
        .mock("POST", "/token")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"access_token": "minted", "expires_in": 3600, "token_type": "Bearer"}"#)
        .create_async()
        .await;
    let create = server
        .mock("POST", "/calendars/primary/events")
        .match_header("authorization", "Bearer minted")
        .with_status(200)
        .with_body(r#"{"id": "evt-1"}"#)
        .create_async()
        .await;

    let mut client = CalendarClient::new(config_for(&server.url()), expired_tokens()).unwrap();
    client.create_event(&descriptor()).await.unwrap();

    token.assert_async().await;
    create.assert_async().await;
    // Refresh response carried no refresh_token; the original survives.
    assert_eq!(client.tokens().access_token, "minted");
    assert_eq!(client.tokens().refresh_token.as_deref(), Some("refresh-1"));
}

#[tokio::test]
async fn test_expired_token_without_refresh_errors_before_network() {
    let mut server = mockito::Server::new_async().await;
    let token = server.mock("POST", "/token").expect(0).create_async().await;
    let create = server
        .mock("POST", "/calendars/primary/events")
        .expect(0)
        .create_async()
        .await;

    let mut tokens = expired_tokens();
    tokens.refresh_token = None;
    let mut client = CalendarClient::new(config_for(&server.url()), tokens).unwrap();

    let err = client.create_event(&descriptor()).await.unwrap_err();
    assert!(matches!(err, SyncError::NoRefreshToken));
    token.assert_async().await;
    create.assert_async().await;
}

#[tokio::test]
async fn test_update_patches_existing_event() {
    let mut server = mockito::Server::new_async().await;
    let update = server
        .mock("PATCH", "/calendars/primary/events/evt-7")
        .match_header("authorization", "Bearer live-token")
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    let mut client = CalendarClient::new(config_for(&server.url()), fresh_tokens()).unwrap();
    client.update_event("evt-7", &descriptor()).await.unwrap();
    update.assert_async().await;
}

#[tokio::test]
async fn test_delete_tolerates_already_gone() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("DELETE", "/calendars/primary/events/evt-9")
        .with_status(410)
        .create_async()
        .await;

    let mut client = CalendarClient::new(config_for(&server.url()), fresh_tokens()).unwrap();
    assert!(client.delete_event("evt-9").await.is_ok());
}

#[tokio::test]
async fn test_provider_rejection_carries_status_and_body() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/calendars/primary/events")
        .with_status(403)
        .with_body(r#"{"error": {"message": "insufficient scope"}}"#)
        .create_async()
        .await;

    let mut client = CalendarClient::new(config_for(&server.url()), fresh_tokens()).unwrap();
    let err = client.create_event(&descriptor()).await.unwrap_err();

    match err {
        SyncError::Provider { status, body } => {
            assert_eq!(status, 403);
            assert!(body.contains("insufficient scope"));
        }
        other => panic!("expected provider error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_sync_pass_survives_one_failing_item() {
    let mut server = mockito::Server::new_async().await;
    // Cancelled appointment's remote delete blows up; the create after
    // it must still run.
    server
        .mock("DELETE", "/calendars/primary/events/ev-bad")
        .with_status(500)
        .with_body("backend exploded")
        .create_async()
        .await;
    let create = server
        .mock("POST", "/calendars/primary/events")
        .with_status(200)
        .with_body(r#"{"id": "ev-new"}"#)
        .create_async()
        .await;

    let now = Utc::now();
    let mut cancelled = Appointment::new("pet-1", "Dental cleaning", now + Duration::days(2), 45);
    cancelled.status = AppointmentStatus::Cancelled;
    cancelled.calendar_event_id = Some("ev-bad".to_string());
    let upcoming = Appointment::new("pet-1", "Checkup", now + Duration::days(3), 30);
    let mut appointments = vec![cancelled, upcoming];

    let pet_names: HashMap<String, String> =
        [("pet-1".to_string(), "Milo".to_string())].into_iter().collect();

    let mut client = CalendarClient::new(config_for(&server.url()), fresh_tokens()).unwrap();
    let report = sync_appointments(&mut client, &mut appointments, &pet_names, 60, now).await;

    create.assert_async().await;
    assert_eq!(report.synced, 1);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].item_id, appointments[0].id);
    // Failed delete leaves the stale id for the next pass.
    assert_eq!(appointments[0].calendar_event_id.as_deref(), Some("ev-bad"));
    assert_eq!(appointments[1].calendar_event_id.as_deref(), Some("ev-new"));
}

#[tokio::test]
async fn test_publish_course_creates_one_event_per_descriptor() {
    let mut server = mockito::Server::new_async().await;
    let create = server
        .mock("POST", "/calendars/primary/events")
        .with_status(200)
        .with_body(r#"{"id": "evt-1"}"#)
        .expect(3)
        .create_async()
        .await;

    let mut slots = TimeSlots::new();
    slots.push(TimeSlot::new(9, 0).unwrap()).unwrap();
    let course = MedicationCourse {
        medication: "Amoxicillin".to_string(),
        dosage: "50mg".to_string(),
        instructions: "With food".to_string(),
        pet_name: "Milo".to_string(),
        start_date: chrono::NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
        end_date: chrono::NaiveDate::from_ymd_opt(2025, 3, 12).unwrap(),
        slots,
        schedule: ScheduleType::Daily,
        reminder_lead_min: 10,
        custom_description: None,
    };

    let mut client = CalendarClient::new(config_for(&server.url()), fresh_tokens()).unwrap();
    let outcome = publish_course(&mut client, &course).await;

    create.assert_async().await;
    assert_eq!(outcome.event_ids.len(), 3);
    assert_eq!(outcome.report.synced, 3);
    assert!(outcome.report.is_clean());
}
