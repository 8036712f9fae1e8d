//! Building placeholder writes from source events.

use crate::backend::{EventUpdate, NewEvent};
use crate::error::CalSyncResult;
use crate::event::{Availability, Event, ParticipationStatus};
use crate::tracking::{TrackingRecord, decode_marker, encode_marker, new_tracking_id};

/// Availability a placeholder should show for `source`.
///
/// Out-of-office wins over a tentative response; everything else is busy.
pub fn placeholder_availability(source: &Event) -> Availability {
    if source.availability == Some(Availability::Unavailable) {
        Availability::Unavailable
    } else if source.participant_status == Some(ParticipationStatus::Tentative) {
        Availability::Tentative
    } else {
        Availability::Busy
    }
}

/// A fresh placeholder for `source` in `target_calendar_id`.
pub fn new_placeholder(
    source: &Event,
    target_calendar_id: &str,
    title: &str,
) -> CalSyncResult<NewEvent> {
    let record = TrackingRecord::for_source(source, new_tracking_id());

    Ok(NewEvent {
        calendar_id: target_calendar_id.to_string(),
        title: title.to_string(),
        start: source.start,
        end: source.end,
        all_day: source.all_day,
        notes: encode_marker(&record)?,
        availability: placeholder_availability(source),
    })
}

/// Bring `placeholder` up to date with `source`, keeping its tracking id.
pub fn placeholder_update(source: &Event, placeholder: &Event) -> CalSyncResult<EventUpdate> {
    let tracking_id = decode_marker(placeholder.notes())
        .map(|record| record.tracking_id)
        .unwrap_or_else(new_tracking_id);
    let record = TrackingRecord::for_source(source, tracking_id);

    Ok(EventUpdate {
        start: Some(source.start),
        end: Some(source.end),
        notes: Some(encode_marker(&record)?),
        availability: Some(placeholder_availability(source)),
    })
}
