//! # PawCare Core Library
//!
//! This library provides the core business logic for the PawCare pet
//! health manager. It implements a CLI-first philosophy where all
//! operations are available via a standalone CLI binary, with any GUI
//! being a thin layer over the same core library.
//!
//! ## Architecture
//!
//! - **Schedule**: Medication schedule types and per-day dose slots
//! - **Reminders**: Expands a medication course into dated calendar events
//! - **Sync**: External calendar client with OAuth2 token refresh plus a
//!   best-effort engine for appointments and medication courses
//! - **Storage**: SQLite-based clinic records and TOML-based configuration
//!
//! ## Key Components
//!
//! - [`ScheduleType`]: Dosing frequency resolved from free-form text
//! - [`expand_course`]: Medication course to calendar event expansion
//! - [`CalendarClient`]: Remote calendar event operations
//! - [`ClinicDb`]: Pet, prescription and appointment persistence
//! - [`Config`]: Application configuration management

pub mod calendar;
pub mod clinic;
pub mod error;
pub mod integrations;
pub mod notifications;
pub mod reminders;
pub mod schedule;
pub mod storage;
pub mod sync;

pub use calendar::{EventCategory, EventDescriptor, EventStatus};
pub use clinic::{Appointment, AppointmentStatus, Pet, Prescription};
pub use error::{ConfigError, CoreError, DatabaseError, OAuthError, ValidationError};
pub use integrations::{authorize, OAuthConfig, OAuthTokens};
pub use notifications::{Notification, NotificationKind};
pub use reminders::{expand_course, MedicationCourse};
pub use schedule::{ScheduleType, TimeSlot, TimeSlots};
pub use storage::{ClinicDb, Config};
pub use sync::{
    publish_course, sync_appointments, CalendarClient, CalendarConfig, SyncReport,
};
