use crate::event::{Availability, Event, ParticipationStatus};
use crate::tracking::is_placeholder;

/// Whether a source event should be mirrored into other calendars.
///
/// Placeholders are never mirrored (that would bounce them back and forth),
/// nor are free events or invitations the owner hasn't accepted.
pub fn is_eligible(event: &Event) -> bool {
    if is_placeholder(event.notes()) {
        return false;
    }

    if event.availability == Some(Availability::Free) {
        return false;
    }

    !matches!(
        event.participant_status,
        Some(ParticipationStatus::Pending | ParticipationStatus::Declined)
    )
}
