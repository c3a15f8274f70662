//! Calendar synchronization layer.
//!
//! Turns event descriptors into create/update/delete calls against the
//! external calendar provider, including access-token lifecycle, and
//! runs the best-effort bulk passes over clinic records.

pub mod client;
pub mod engine;
pub mod types;

pub use client::{CalendarClient, CalendarConfig, TOKEN_EXPIRY_BUFFER_SECS};
pub use engine::{publish_course, retract_events, sync_appointments, PublishOutcome};
pub use types::{SyncError, SyncFailure, SyncReport};
