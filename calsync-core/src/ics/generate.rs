//! ICS file generation.

use chrono::{DateTime, Utc};
use icalendar::{Calendar, Component, Property, ValueType};

use crate::event::{Availability, Event};

/// Generate .ics content for an event.
///
/// `owner_email` is written as an ATTENDEE carrying the event's participant
/// status, so that [`parse_event`](super::parse_event) reads the same status back.
pub fn generate_ics(event: &Event, owner_email: Option<&str>) -> String {
    let mut cal = Calendar::new();

    let mut ics_event = icalendar::Event::new();
    ics_event.uid(&event.id);
    ics_event.summary(&event.title);

    let dtstamp = event.updated.unwrap_or_else(Utc::now);
    ics_event.add_property("DTSTAMP", format_utc(&dtstamp));

    if let Some(updated) = event.updated {
        ics_event.add_property("LAST-MODIFIED", format_utc(&updated));
    }

    add_datetime_property(&mut ics_event, "DTSTART", &event.start, event.all_day);
    add_datetime_property(&mut ics_event, "DTEND", &event.end, event.all_day);

    if let Some(ref notes) = event.notes {
        ics_event.description(notes);
    }

    let availability = event.availability.unwrap_or(Availability::Busy);
    if availability == Availability::Free {
        ics_event.add_property("TRANSP", "TRANSPARENT");
    } else {
        ics_event.add_property("TRANSP", "OPAQUE");
    }
    ics_event.add_property("X-MICROSOFT-CDO-BUSYSTATUS", busy_status(availability));

    if let (Some(email), Some(status)) = (owner_email, event.participant_status) {
        let mut prop = Property::new("ATTENDEE", format!("mailto:{}", email));
        prop.add_parameter("PARTSTAT", status.as_ics_str());
        ics_event.append_multi_property(prop);
    }

    let ics_event = ics_event.done();
    cal.push(ics_event);
    let cal = cal.done();

    strip_ics_bloat(&cal.to_string())
}

fn busy_status(availability: Availability) -> &'static str {
    match availability {
        Availability::Busy => "BUSY",
        Availability::Free => "FREE",
        Availability::Tentative => "TENTATIVE",
        Availability::Unavailable => "OOF",
    }
}

fn format_utc(dt: &DateTime<Utc>) -> String {
    dt.format("%Y%m%dT%H%M%SZ").to_string()
}

/// Clean up ICS output from the icalendar crate
/// - Replace PRODID with CALSYNC
/// - Remove CALSCALE:GREGORIAN (it's the default)
fn strip_ics_bloat(ics: &str) -> String {
    let mut result = String::with_capacity(ics.len());

    for line in ics.lines() {
        if line.starts_with("PRODID:") {
            result.push_str("PRODID:CALSYNC\r\n");
            continue;
        }

        if line == "CALSCALE:GREGORIAN" {
            continue;
        }

        result.push_str(line);
        result.push_str("\r\n");
    }

    result
}

/// All-day values are written as VALUE=DATE, everything else as UTC.
fn add_datetime_property(
    ics_event: &mut icalendar::Event,
    name: &str,
    time: &DateTime<Utc>,
    all_day: bool,
) {
    if all_day {
        let mut prop = Property::new(name, time.format("%Y%m%d").to_string());
        prop.append_parameter(ValueType::Date);
        ics_event.append_property(prop);
    } else {
        ics_event.add_property(name, format_utc(time));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::ParticipationStatus;
    use crate::ics::parse_event;
    use crate::tracking::{TrackingRecord, decode_marker, encode_marker};
    use chrono::TimeZone;

    fn make_test_event() -> Event {
        Event {
            id: "test-event-123@calsync".to_string(),
            calendar_id: "work".to_string(),
            title: "Test Event".to_string(),
            start: Utc.with_ymd_and_hms(2025, 3, 20, 15, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2025, 3, 20, 16, 0, 0).unwrap(),
            all_day: false,
            notes: None,
            availability: Some(Availability::Busy),
            participant_status: None,
            updated: None,
        }
    }

    #[test]
    fn test_generate_ics_all_day_event_has_value_date() {
        let mut event = make_test_event();
        event.start = Utc.with_ymd_and_hms(2025, 3, 20, 0, 0, 0).unwrap();
        event.end = Utc.with_ymd_and_hms(2025, 3, 21, 0, 0, 0).unwrap();
        event.all_day = true;

        let ics = generate_ics(&event, None);

        assert!(
            ics.contains("DTSTART;VALUE=DATE:20250320"),
            "DTSTART should have VALUE=DATE parameter. ICS:\n{}",
            ics
        );
        assert!(
            ics.contains("DTEND;VALUE=DATE:20250321"),
            "DTEND should have VALUE=DATE parameter. ICS:\n{}",
            ics
        );
    }

    #[test]
    fn test_generate_ics_writes_busy_status() {
        let mut event = make_test_event();
        event.availability = Some(Availability::Unavailable);

        let ics = generate_ics(&event, None);
        assert!(ics.contains("X-MICROSOFT-CDO-BUSYSTATUS:OOF"), "ICS:\n{}", ics);
        assert!(ics.contains("TRANSP:OPAQUE"), "ICS:\n{}", ics);
        assert!(ics.contains("PRODID:CALSYNC"), "ICS:\n{}", ics);
        assert!(!ics.contains("CALSCALE"), "ICS:\n{}", ics);
    }

    #[test]
    fn test_marker_survives_ics_roundtrip() {
        let mut event = make_test_event();
        let record = TrackingRecord::for_source(&make_test_event(), "abcd1234".to_string());
        event.notes = Some(encode_marker(&record).unwrap());

        let ics = generate_ics(&event, None);
        let parsed = parse_event(&ics, "work", None).expect("Should parse generated ICS");

        assert_eq!(decode_marker(parsed.notes()), Some(record));
    }

    #[test]
    fn test_roundtrip_keeps_sync_relevant_fields() {
        let mut event = make_test_event();
        event.availability = Some(Availability::Tentative);
        event.participant_status = Some(ParticipationStatus::Tentative);
        event.updated = Some(Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap());

        let ics = generate_ics(&event, Some("me@example.com"));
        let parsed = parse_event(&ics, "work", Some("me@example.com")).unwrap();

        assert_eq!(parsed, event);
    }
}
