//! Error types for calsync.

use thiserror::Error;

/// Errors that can occur in calsync operations.
#[derive(Error, Debug)]
pub enum CalSyncError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Calendar access denied: {0}")]
    AccessDenied(String),

    #[error("Calendar not found: {0}")]
    CalendarNotFound(String),

    #[error("Calendar is read-only: {0}")]
    CalendarReadOnly(String),

    #[error("Event not found: {0}")]
    EventNotFound(String),

    #[error("Failed to save event: {0}")]
    SaveFailed(String),

    #[error("Failed to delete event: {0}")]
    DeleteFailed(String),

    #[error("At least two calendars are required to sync, got {0}")]
    NotEnoughCalendars(usize),

    #[error("A sync run is already in progress")]
    AlreadyRunning,

    #[error("ICS parse error: {0}")]
    IcsParse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for calsync operations.
pub type CalSyncResult<T> = Result<T, CalSyncError>;
