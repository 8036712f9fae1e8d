//! Backend-neutral event types.
//!
//! Backends convert whatever they store into these types, and the diff engine
//! and orchestrator work exclusively with them. Events are read-only snapshots:
//! changes go back to a backend as create/update/delete requests.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// A calendar event as reported by a backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Stable within one calendar. Recurring instances may share it.
    pub id: String,
    pub calendar_id: String,
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub all_day: bool,
    pub notes: Option<String>,
    /// `None` when the backend can't classify the event
    pub availability: Option<Availability>,
    /// The calendar owner's own response, if they are an attendee
    pub participant_status: Option<ParticipationStatus>,
    /// Last modification time, if the backend tracks one
    pub updated: Option<DateTime<Utc>>,
}

impl Event {
    pub fn notes(&self) -> &str {
        self.notes.as_deref().unwrap_or("")
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title)
    }
}

/// Busy/free classification of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    Busy,
    Free,
    Tentative,
    /// Out of office
    Unavailable,
}

impl Availability {
    /// Integer code used in content fingerprints. Frozen.
    pub fn code(self) -> i64 {
        match self {
            Availability::Busy => 0,
            Availability::Free => 1,
            Availability::Tentative => 2,
            Availability::Unavailable => 3,
        }
    }
}

/// The calendar owner's response to an invitation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipationStatus {
    Pending,
    Accepted,
    Declined,
    Tentative,
}

impl ParticipationStatus {
    /// Integer code used in content fingerprints. Frozen.
    pub fn code(self) -> i64 {
        match self {
            ParticipationStatus::Pending => 1,
            ParticipationStatus::Accepted => 2,
            ParticipationStatus::Declined => 3,
            ParticipationStatus::Tentative => 4,
        }
    }

    /// Convert from the PARTSTAT parameter value
    pub fn from_ics_str(s: &str) -> Option<Self> {
        match s {
            "NEEDS-ACTION" => Some(ParticipationStatus::Pending),
            "ACCEPTED" => Some(ParticipationStatus::Accepted),
            "DECLINED" => Some(ParticipationStatus::Declined),
            "TENTATIVE" => Some(ParticipationStatus::Tentative),
            _ => None,
        }
    }

    pub fn as_ics_str(self) -> &'static str {
        match self {
            ParticipationStatus::Pending => "NEEDS-ACTION",
            ParticipationStatus::Accepted => "ACCEPTED",
            ParticipationStatus::Declined => "DECLINED",
            ParticipationStatus::Tentative => "TENTATIVE",
        }
    }
}

/// Format an instant the way fingerprints, markers and occurrence keys expect:
/// RFC 3339, UTC, whole seconds, `Z` suffix.
pub fn iso8601(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, true)
}
