//! Calendars stored as directories of `.ics` files.
//!
//! ```text
//! ~/calendar/
//!   work/
//!     .calsync/config.toml
//!     2025-03-20T1000__planning.ics
//!   personal/
//!     ...
//! ```
//!
//! The directory name is the calendar id. Each file holds a single VEVENT
//! whose UID is the event id.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::backend::{CalendarBackend, CalendarMetadata, EventUpdate, NewEvent, overlaps};
use crate::config::{CalendarConfig, SyncConfig};
use crate::error::{CalSyncError, CalSyncResult};
use crate::event::Event;
use crate::ics::{generate_ics, parse_event};

/// An event file on disk.
struct StoredEvent {
    path: PathBuf,
    event: Event,
    owner_email: Option<String>,
}

pub struct LocalBackend {
    root: PathBuf,
}

impl LocalBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        LocalBackend { root: root.into() }
    }

    pub fn from_config(config: &SyncConfig) -> Self {
        Self::new(config.calendar_path())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn calendar_path(&self, calendar_id: &str) -> CalSyncResult<PathBuf> {
        let is_plain_name = !calendar_id.is_empty()
            && !calendar_id.starts_with('.')
            && !calendar_id.contains(['/', '\\']);
        let path = self.root.join(calendar_id);

        if is_plain_name && path.is_dir() {
            Ok(path)
        } else {
            Err(CalSyncError::CalendarNotFound(calendar_id.to_string()))
        }
    }

    /// Subdirectories of the root, sorted by name.
    fn calendar_ids(&self) -> CalSyncResult<Vec<String>> {
        let entries = std::fs::read_dir(&self.root)?;

        let mut ids: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_dir())
            .filter_map(|path| path.file_name().and_then(|n| n.to_str()).map(String::from))
            .filter(|name| !name.starts_with('.'))
            .collect();

        ids.sort();
        Ok(ids)
    }

    fn stored_events(&self, calendar_id: &str) -> CalSyncResult<Vec<StoredEvent>> {
        let dir = self.calendar_path(calendar_id)?;
        let config = CalendarConfig::load(&dir)?;
        let owner_email = config.owner_email;

        let entries = std::fs::read_dir(&dir)?;

        let stored = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|e| e == "ics"))
            .filter_map(|path| {
                let content = std::fs::read_to_string(&path).ok()?;
                match parse_event(&content, calendar_id, owner_email.as_deref()) {
                    Some(event) => Some(StoredEvent {
                        path,
                        event,
                        owner_email: owner_email.clone(),
                    }),
                    None => {
                        debug!(path = %path.display(), "Skipping unparseable event file");
                        None
                    }
                }
            })
            .collect();

        Ok(stored)
    }

    /// Find the file holding `event_id`, searching every calendar.
    ///
    /// Calendars that cannot be read are skipped, so one broken directory
    /// does not hide events stored in the others.
    fn locate(&self, event_id: &str) -> CalSyncResult<Option<StoredEvent>> {
        for calendar_id in self.calendar_ids()? {
            let stored = match self.stored_events(&calendar_id) {
                Ok(stored) => stored,
                Err(e) => {
                    warn!(calendar = %calendar_id, error = %e, "Skipping unreadable calendar");
                    continue;
                }
            };
            if let Some(found) = stored.into_iter().find(|s| s.event.id == event_id) {
                return Ok(Some(found));
            }
        }
        Ok(None)
    }
}

impl CalendarBackend for LocalBackend {
    async fn list_calendars(&self) -> CalSyncResult<Vec<CalendarMetadata>> {
        self.calendar_ids()?
            .into_iter()
            .map(|id| {
                let config = CalendarConfig::load(&self.root.join(&id))?;
                Ok(CalendarMetadata {
                    title: config.name.unwrap_or_else(|| id.clone()),
                    writable: !config.read_only,
                    id,
                })
            })
            .collect()
    }

    async fn get_events(
        &self,
        calendar_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> CalSyncResult<Vec<Event>> {
        let mut events: Vec<Event> = self
            .stored_events(calendar_id)?
            .into_iter()
            .map(|s| s.event)
            .filter(|e| overlaps(e, start, end))
            .collect();

        events.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.id.cmp(&b.id)));
        Ok(events)
    }

    async fn create_event(&self, new: NewEvent) -> CalSyncResult<Event> {
        let dir = self.calendar_path(&new.calendar_id)?;
        let config = CalendarConfig::load(&dir)?;
        if config.read_only {
            return Err(CalSyncError::CalendarReadOnly(new.calendar_id));
        }

        let event = Event {
            id: Uuid::new_v4().to_string(),
            calendar_id: new.calendar_id,
            title: new.title,
            start: new.start,
            end: new.end,
            all_day: new.all_day,
            notes: Some(new.notes),
            availability: Some(new.availability),
            participant_status: None,
            updated: Some(Utc::now()),
        };

        let filename = filename_for(&event, &dir)?;
        let content = generate_ics(&event, config.owner_email.as_deref());
        std::fs::write(dir.join(&filename), content)
            .map_err(|e| CalSyncError::SaveFailed(format!("{}: {}", filename, e)))?;

        Ok(event)
    }

    async fn update_event(&self, event_id: &str, update: EventUpdate) -> CalSyncResult<Event> {
        let StoredEvent {
            path,
            mut event,
            owner_email,
        } = self
            .locate(event_id)
            .map_err(|e| CalSyncError::SaveFailed(e.to_string()))?
            .ok_or_else(|| CalSyncError::EventNotFound(event_id.to_string()))?;

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

        let content = generate_ics(&event, owner_email.as_deref());
        std::fs::write(&path, content)
            .map_err(|e| CalSyncError::SaveFailed(format!("{}: {}", path.display(), e)))?;

        Ok(event)
    }

    async fn delete_event(&self, event_id: &str) -> CalSyncResult<bool> {
        let located = self
            .locate(event_id)
            .map_err(|e| CalSyncError::DeleteFailed(e.to_string()))?;
        let Some(stored) = located else {
            return Ok(false);
        };

        std::fs::remove_file(&stored.path)
            .map_err(|e| CalSyncError::DeleteFailed(format!("{}: {}", stored.path.display(), e)))?;

        Ok(true)
    }

    async fn request_access(&self) -> CalSyncResult<bool> {
        std::fs::create_dir_all(&self.root).map_err(|e| {
            CalSyncError::AccessDenied(format!("{}: {}", self.root.display(), e))
        })?;
        std::fs::read_dir(&self.root).map_err(|e| {
            CalSyncError::AccessDenied(format!("{}: {}", self.root.display(), e))
        })?;
        Ok(true)
    }
}

// =============================================================================
// Filename generation
// =============================================================================

/// Generate a unique filename for an event, handling collisions.
fn filename_for(event: &Event, dir: &Path) -> CalSyncResult<String> {
    let base = base_filename(event);
    let stem = base.trim_end_matches(".ics");

    if !dir.join(&base).exists() {
        return Ok(base);
    }

    for n in 2..=100 {
        let suffixed = format!("{}-{}.ics", stem, n);
        if !dir.join(&suffixed).exists() {
            return Ok(suffixed);
        }
    }

    Err(CalSyncError::SaveFailed(format!(
        "Too many filename collisions for {}",
        base
    )))
}

fn base_filename(event: &Event) -> String {
    let slug = slugify(&event.title);

    let date = if event.all_day {
        event.start.format("%Y-%m-%d").to_string()
    } else {
        event.start.format("%Y-%m-%dT%H%M").to_string()
    };

    if slug.is_empty() {
        format!("{}.ics", date)
    } else {
        format!("{}__{}.ics", date, slug)
    }
}

fn slugify(s: &str) -> String {
    s.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
        .chars()
        .take(50)
        .collect()
}
