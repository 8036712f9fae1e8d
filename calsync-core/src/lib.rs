//! Core of calsync: mirrors busy time across calendars as opaque placeholders.
//!
//! - [`tracking`] encodes the provenance marker stored in placeholder notes
//! - [`diff`] decides what to create, update, or delete for one calendar pair
//! - [`sync`] runs the diff across every pair and applies it through a
//!   [`backend::CalendarBackend`]
//! - [`ics`] and [`backend::LocalBackend`] map calendars onto `.ics` files

pub mod backend;
pub mod config;
pub mod diff;
pub mod error;
pub mod event;
pub mod ics;
pub mod sync;
pub mod tracking;

pub use backend::{
    CalendarBackend, CalendarMetadata, EventUpdate, LocalBackend, MemoryBackend, NewEvent,
};
pub use config::{CalendarConfig, SyncConfig};
pub use error::{CalSyncError, CalSyncResult};
pub use event::{Availability, Event, ParticipationStatus};
pub use sync::{Orchestrator, SyncResult, SyncSummary, SyncWindow};
