use std::fmt;

use crate::diff::DiffKind;
use crate::event::Event;

/// One change needed to bring a target calendar in line with a source.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncAction {
    Create {
        source: Event,
        reason: String,
    },
    Update {
        source: Event,
        placeholder: Event,
        reason: String,
    },
    Delete {
        placeholder: Event,
        reason: String,
    },
}

impl SyncAction {
    pub fn kind(&self) -> DiffKind {
        match self {
            SyncAction::Create { .. } => DiffKind::Create,
            SyncAction::Update { .. } => DiffKind::Update,
            SyncAction::Delete { .. } => DiffKind::Delete,
        }
    }

    /// Diagnostic only
    pub fn reason(&self) -> &str {
        match self {
            SyncAction::Create { reason, .. }
            | SyncAction::Update { reason, .. }
            | SyncAction::Delete { reason, .. } => reason,
        }
    }

    /// The event this action is about: the source for creates and updates,
    /// the placeholder for deletes.
    pub fn event(&self) -> &Event {
        match self {
            SyncAction::Create { source, .. } | SyncAction::Update { source, .. } => source,
            SyncAction::Delete { placeholder, .. } => placeholder,
        }
    }
}

impl fmt::Display for SyncAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({})", self.kind(), self.event(), self.reason())
    }
}
