//! ICS file parsing using the icalendar crate's parser.

use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use icalendar::{
    CalendarDateTime, DatePerhapsTime,
    parser::{Property, read_calendar, unfold},
};

use crate::event::{Availability, Event, ParticipationStatus};

/// Parse ICS content into an Event belonging to `calendar_id`.
///
/// `owner_email` identifies the calendar owner among the attendees; their
/// PARTSTAT becomes the event's participant status.
pub fn parse_event(content: &str, calendar_id: &str, owner_email: Option<&str>) -> Option<Event> {
    let unfolded = unfold(content);
    let calendar = read_calendar(&unfolded).ok()?;
    let vevent = calendar.components.iter().find(|c| c.name == "VEVENT")?;

    let id = vevent.find_prop("UID")?.val.to_string();
    let title = vevent
        .find_prop("SUMMARY")
        .map(|p| unescape_text(p.val.as_ref()))
        .unwrap_or_else(|| "(No title)".to_string());

    let (start, all_day) = to_utc(DatePerhapsTime::try_from(vevent.find_prop("DTSTART")?).ok()?)?;
    let end = match vevent
        .find_prop("DTEND")
        .and_then(|p| DatePerhapsTime::try_from(p).ok())
        .and_then(to_utc)
    {
        Some((end, _)) => end,
        None if all_day => start + Duration::days(1),
        None => start,
    };

    let notes = vevent
        .find_prop("DESCRIPTION")
        .map(|p| unescape_text(p.val.as_ref()));

    let updated = vevent
        .find_prop("LAST-MODIFIED")
        .and_then(|p| parse_utc_stamp(p.val.as_ref()));

    let availability = vevent
        .find_prop("X-MICROSOFT-CDO-BUSYSTATUS")
        .and_then(|p| busy_status(p.val.as_ref()))
        .unwrap_or_else(|| {
            match vevent.find_prop("TRANSP").map(|p| p.val.as_ref() == "TRANSPARENT") {
                Some(true) => Availability::Free,
                _ => Availability::Busy,
            }
        });

    let participant_status = owner_email.and_then(|owner| {
        vevent
            .properties
            .iter()
            .filter(|p| p.name == "ATTENDEE")
            .find(|p| attendee_email(p).eq_ignore_ascii_case(owner))
            .and_then(partstat)
    });

    Some(Event {
        id,
        calendar_id: calendar_id.to_string(),
        title,
        start,
        end,
        all_day,
        notes,
        availability: Some(availability),
        participant_status,
        updated,
    })
}

/// Resolve a DTSTART/DTEND value to a UTC instant, plus whether it was a date.
///
/// Floating times and unknown TZIDs are read as UTC.
fn to_utc(dpt: DatePerhapsTime) -> Option<(DateTime<Utc>, bool)> {
    match dpt {
        DatePerhapsTime::Date(d) => Some((d.and_hms_opt(0, 0, 0)?.and_utc(), true)),
        DatePerhapsTime::DateTime(cal_dt) => {
            let instant = match cal_dt {
                CalendarDateTime::Utc(dt) => dt,
                CalendarDateTime::Floating(naive) => naive.and_utc(),
                CalendarDateTime::WithTimezone { date_time, tzid } => match tzid.parse::<Tz>() {
                    Ok(tz) => tz
                        .from_local_datetime(&date_time)
                        .earliest()?
                        .with_timezone(&Utc),
                    Err(_) => date_time.and_utc(),
                },
            };
            Some((instant, false))
        }
    }
}

fn parse_utc_stamp(value: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value.trim_end_matches('Z'), "%Y%m%dT%H%M%S")
        .ok()
        .map(|dt| dt.and_utc())
}

pub(crate) fn busy_status(value: &str) -> Option<Availability> {
    match value {
        "FREE" => Some(Availability::Free),
        "TENTATIVE" => Some(Availability::Tentative),
        "BUSY" | "WORKINGELSEWHERE" => Some(Availability::Busy),
        "OOF" => Some(Availability::Unavailable),
        _ => None,
    }
}

fn attendee_email<'a>(prop: &'a Property<'a>) -> &'a str {
    let val = prop.val.as_ref();
    val.strip_prefix("mailto:")
        .or_else(|| val.strip_prefix("MAILTO:"))
        .unwrap_or(val)
}

fn partstat(prop: &Property) -> Option<ParticipationStatus> {
    prop.params
        .iter()
        .find(|p| p.key == "PARTSTAT")
        .and_then(|p| p.val.as_ref())
        .and_then(|v| ParticipationStatus::from_ics_str(v.as_ref()))
}

/// Undo RFC 5545 TEXT escaping (`\\`, `\;`, `\,`, `\n`).
fn unescape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') | Some('N') => out.push('\n'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }

    out
}
