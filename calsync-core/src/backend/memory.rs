//! In-process calendar store.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::backend::{CalendarBackend, CalendarMetadata, EventUpdate, NewEvent, overlaps};
use crate::error::{CalSyncError, CalSyncResult};
use crate::event::Event;

struct MemoryCalendar {
    metadata: CalendarMetadata,
    events: Vec<Event>,
}

struct MemoryState {
    calendars: Vec<MemoryCalendar>,
    access_granted: bool,
    failing_fetches: HashSet<String>,
    /// Calendar id -> fetches that still succeed before failing
    fetch_budgets: HashMap<String, usize>,
    failing_writes: HashSet<String>,
    failing_create_starts: HashSet<DateTime<Utc>>,
}

/// A backend that keeps calendars in memory.
///
/// Fetches and writes can be made to fail per calendar, which is how partial
/// failures are exercised.
pub struct MemoryBackend {
    state: Mutex<MemoryState>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        MemoryBackend {
            state: Mutex::new(MemoryState {
                calendars: Vec::new(),
                access_granted: true,
                failing_fetches: HashSet::new(),
                fetch_budgets: HashMap::new(),
                failing_writes: HashSet::new(),
                failing_create_starts: HashSet::new(),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn add_calendar(&self, id: &str, title: &str) {
        self.push_calendar(id, title, true);
    }

    pub fn add_read_only_calendar(&self, id: &str, title: &str) {
        self.push_calendar(id, title, false);
    }

    fn push_calendar(&self, id: &str, title: &str, writable: bool) {
        self.state().calendars.push(MemoryCalendar {
            metadata: CalendarMetadata {
                id: id.to_string(),
                title: title.to_string(),
                writable,
            },
            events: Vec::new(),
        });
    }

    /// Insert or replace (by id and start) an event in its calendar.
    pub fn upsert_event(&self, event: Event) -> CalSyncResult<()> {
        let mut state = self.state();
        let calendar = state
            .calendars
            .iter_mut()
            .find(|c| c.metadata.id == event.calendar_id)
            .ok_or_else(|| CalSyncError::CalendarNotFound(event.calendar_id.clone()))?;

        match calendar
            .events
            .iter_mut()
            .find(|e| e.id == event.id && e.start == event.start)
        {
            Some(slot) => *slot = event,
            None => calendar.events.push(event),
        }
        Ok(())
    }

    /// Remove every event with this id from the given calendar.
    pub fn remove_event(&self, calendar_id: &str, event_id: &str) {
        let mut state = self.state();
        if let Some(calendar) = state
            .calendars
            .iter_mut()
            .find(|c| c.metadata.id == calendar_id)
        {
            calendar.events.retain(|e| e.id != event_id);
        }
    }

    /// Every event in a calendar, regardless of date.
    pub fn events(&self, calendar_id: &str) -> Vec<Event> {
        self.state()
            .calendars
            .iter()
            .find(|c| c.metadata.id == calendar_id)
            .map(|c| c.events.clone())
            .unwrap_or_default()
    }

    pub fn set_access_granted(&self, granted: bool) {
        self.state().access_granted = granted;
    }

    pub fn fail_fetches_for(&self, calendar_id: &str) {
        self.state().failing_fetches.insert(calendar_id.to_string());
    }

    /// Let `successes` more fetches of the calendar through, then fail.
    pub fn fail_fetches_after(&self, calendar_id: &str, successes: usize) {
        self.state()
            .fetch_budgets
            .insert(calendar_id.to_string(), successes);
    }

    pub fn fail_writes_to(&self, calendar_id: &str) {
        self.state().failing_writes.insert(calendar_id.to_string());
    }

    /// Fail creates of events starting at `start`, in any calendar.
    pub fn fail_creates_at(&self, start: DateTime<Utc>) {
        self.state().failing_create_starts.insert(start);
    }
}

impl MemoryState {
    fn calendar_mut(&mut self, calendar_id: &str) -> CalSyncResult<&mut MemoryCalendar> {
        self.calendars
            .iter_mut()
            .find(|c| c.metadata.id == calendar_id)
            .ok_or_else(|| CalSyncError::CalendarNotFound(calendar_id.to_string()))
    }

    /// Calendar id and index of the first event with this id.
    fn locate(&self, event_id: &str) -> Option<(String, usize)> {
        self.calendars.iter().find_map(|c| {
            c.events
                .iter()
                .position(|e| e.id == event_id)
                .map(|i| (c.metadata.id.clone(), i))
        })
    }
}

impl CalendarBackend for MemoryBackend {
    async fn list_calendars(&self) -> CalSyncResult<Vec<CalendarMetadata>> {
        Ok(self
            .state()
            .calendars
            .iter()
            .map(|c| c.metadata.clone())
            .collect())
    }

    async fn get_events(
        &self,
        calendar_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> CalSyncResult<Vec<Event>> {
        let mut state = self.state();
        let budget_spent = match state.fetch_budgets.get_mut(calendar_id) {
            Some(0) => true,
            Some(remaining) => {
                *remaining -= 1;
                false
            }
            None => false,
        };
        if budget_spent || state.failing_fetches.contains(calendar_id) {
            return Err(CalSyncError::Io(std::io::Error::other(format!(
                "simulated fetch failure for {calendar_id}"
            ))));
        }

        let calendar = state.calendar_mut(calendar_id)?;
        Ok(calendar
            .events
            .iter()
            .filter(|e| overlaps(e, start, end))
            .cloned()
            .collect())
    }

    async fn create_event(&self, event: NewEvent) -> CalSyncResult<Event> {
        let mut state = self.state();
        let failing = state.failing_writes.contains(&event.calendar_id)
            || state.failing_create_starts.contains(&event.start);
        let calendar = state.calendar_mut(&event.calendar_id)?;

        if !calendar.metadata.writable {
            return Err(CalSyncError::CalendarReadOnly(event.calendar_id));
        }
        if failing {
            return Err(CalSyncError::SaveFailed(format!(
                "simulated write failure for {}",
                event.calendar_id
            )));
        }

        let created = Event {
            id: Uuid::new_v4().to_string(),
            calendar_id: event.calendar_id,
            title: event.title,
            start: event.start,
            end: event.end,
            all_day: event.all_day,
            notes: Some(event.notes),
            availability: Some(event.availability),
            participant_status: None,
            updated: Some(Utc::now()),
        };
        calendar.events.push(created.clone());
        Ok(created)
    }

    async fn update_event(&self, event_id: &str, update: EventUpdate) -> CalSyncResult<Event> {
        let mut state = self.state();
        let (calendar_id, index) = state
            .locate(event_id)
            .ok_or_else(|| CalSyncError::EventNotFound(event_id.to_string()))?;

        if state.failing_writes.contains(&calendar_id) {
            return Err(CalSyncError::SaveFailed(format!(
                "simulated write failure for {calendar_id}"
            )));
        }

        let calendar = state.calendar_mut(&calendar_id)?;
        let event = &mut calendar.events[index];
        if let Some(start) = update.start {
            event.start = start;
        }
        if let Some(end) = update.end {
            event.end = end;
        }
        if let Some(notes) = update.notes {
            event.notes = Some(notes);
        }
        if let Some(availability) = update.availability {
            event.availability = Some(availability);
        }
        event.updated = Some(Utc::now());
        Ok(event.clone())
    }

    async fn delete_event(&self, event_id: &str) -> CalSyncResult<bool> {
        let mut state = self.state();
        let Some((calendar_id, index)) = state.locate(event_id) else {
            return Ok(false);
        };

        if state.failing_writes.contains(&calendar_id) {
            return Err(CalSyncError::DeleteFailed(format!(
                "simulated delete failure for {calendar_id}"
            )));
        }

        state.calendar_mut(&calendar_id)?.events.remove(index);
        Ok(true)
    }

    async fn request_access(&self) -> CalSyncResult<bool> {
        Ok(self.state().access_granted)
    }
}
