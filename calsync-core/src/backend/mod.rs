//! Calendar storage backends.
//!
//! The orchestrator only ever talks to a [`CalendarBackend`]. Two
//! implementations ship with the crate: [`LocalBackend`] reads and writes a
//! directory of `.ics` calendars, [`MemoryBackend`] keeps everything in
//! process and is what the tests run against.

mod local;
mod memory;

pub use local::LocalBackend;
pub use memory::MemoryBackend;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CalSyncResult;
use crate::event::{Availability, Event};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarMetadata {
    pub id: String,
    pub title: String,
    pub writable: bool,
}

/// Everything needed to create an event.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEvent {
    pub calendar_id: String,
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub all_day: bool,
    pub notes: String,
    pub availability: Availability,
}

/// In-place changes to an existing event. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventUpdate {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub availability: Option<Availability>,
}

/// Access to calendar storage.
#[allow(async_fn_in_trait)]
pub trait CalendarBackend {
    async fn list_calendars(&self) -> CalSyncResult<Vec<CalendarMetadata>>;

    async fn list_writable_calendars(&self) -> CalSyncResult<Vec<CalendarMetadata>> {
        let calendars = self.list_calendars().await?;
        Ok(calendars.into_iter().filter(|c| c.writable).collect())
    }

    /// Events overlapping `[start, end)`.
    ///
    /// Fails with `CalendarNotFound` for unknown ids.
    async fn get_events(
        &self,
        calendar_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> CalSyncResult<Vec<Event>>;

    /// Fails with `CalendarNotFound`, `CalendarReadOnly` or `SaveFailed`.
    async fn create_event(&self, event: NewEvent) -> CalSyncResult<Event>;

    /// Fails with `EventNotFound` or `SaveFailed`.
    async fn update_event(&self, event_id: &str, update: EventUpdate) -> CalSyncResult<Event>;

    /// Returns `false` if the event was already gone.
    async fn delete_event(&self, event_id: &str) -> CalSyncResult<bool>;

    /// Fails with `AccessDenied` when calendar access is refused outright.
    async fn request_access(&self) -> CalSyncResult<bool>;
}

/// Whether `event` overlaps `[start, end)`.
pub(crate) fn overlaps(event: &Event, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
    event.start < end && event.end > start
}
