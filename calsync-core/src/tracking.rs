//! Placeholder provenance tracking.
//!
//! Every placeholder carries a marker in its notes:
//!
//! ```text
//! [CALSYNC:{"hash":"…","scal":"…","src":"…","sstart":"…","tid":"…"}]
//! ```
//!
//! The marker layout and the fingerprint input are shared with other
//! implementations of the same tracking scheme and must stay byte-identical:
//! keys sorted, compact JSON, SHA-256 truncated to 16 hex chars.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::{CalSyncError, CalSyncResult};
use crate::event::{Event, iso8601};

pub const MARKER_PREFIX: &str = "[CALSYNC:";
pub const MARKER_SUFFIX: &str = "]";

const FINGERPRINT_LEN: usize = 16;
const TRACKING_ID_LEN: usize = 8;

/// Provenance of a placeholder.
///
/// Field declaration order is the serialized key order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingRecord {
    /// Fingerprint of the source event at last sync
    #[serde(rename = "hash")]
    pub source_hash: String,
    #[serde(rename = "scal")]
    pub source_calendar_id: String,
    #[serde(rename = "src")]
    pub source_event_id: String,
    /// Source start instant, disambiguates recurring occurrences
    #[serde(rename = "sstart", default, skip_serializing_if = "Option::is_none")]
    pub source_start: Option<String>,
    /// Generated once per placeholder, kept across updates
    #[serde(rename = "tid")]
    pub tracking_id: String,
}

impl TrackingRecord {
    /// Record for a placeholder that mirrors `source` right now.
    pub fn for_source(source: &Event, tracking_id: String) -> Self {
        TrackingRecord {
            source_hash: fingerprint(source),
            source_calendar_id: source.calendar_id.clone(),
            source_event_id: source.id.clone(),
            source_start: Some(iso8601(&source.start)),
            tracking_id,
        }
    }
}

/// Content fingerprint over the attributes a placeholder mirrors.
pub fn fingerprint(event: &Event) -> String {
    let canonical = format!(
        r#"{{"all_day":{},"availability":{},"end":{},"participant_status":{},"start":{}}}"#,
        event.all_day,
        optional_code(event.availability.map(|a| a.code())),
        Value::from(iso8601(&event.end)),
        optional_code(event.participant_status.map(|p| p.code())),
        Value::from(iso8601(&event.start)),
    );

    let digest = Sha256::digest(canonical.as_bytes());
    let mut hash = hex::encode(digest);
    hash.truncate(FINGERPRINT_LEN);
    hash
}

fn optional_code(code: Option<i64>) -> Value {
    code.map(Value::from).unwrap_or(Value::Null)
}

/// Complete notes payload for a placeholder.
pub fn encode_marker(record: &TrackingRecord) -> CalSyncResult<String> {
    let json =
        serde_json::to_string(record).map_err(|e| CalSyncError::Serialization(e.to_string()))?;
    Ok(format!("{MARKER_PREFIX}{json}{MARKER_SUFFIX}"))
}

/// Extract the tracking record from free-text notes.
///
/// Anything malformed yields `None`; foreign or corrupted notes are simply
/// not ours.
pub fn decode_marker(notes: &str) -> Option<TrackingRecord> {
    let start = notes.find(MARKER_PREFIX)? + MARKER_PREFIX.len();
    let rest = &notes[start..];
    let end = rest.find(MARKER_SUFFIX)?;
    serde_json::from_str(&rest[..end]).ok()
}

pub fn is_placeholder(notes: &str) -> bool {
    notes.contains(MARKER_PREFIX)
}

pub fn occurrence_key(event: &Event) -> String {
    format!("{}{}", event.id, iso8601(&event.start))
}

pub fn occurrence_key_from_record(record: &TrackingRecord) -> String {
    match &record.source_start {
        Some(start) => format!("{}{}", record.source_event_id, start),
        None => record.source_event_id.clone(),
    }
}

pub fn new_tracking_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(TRACKING_ID_LEN);
    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{Availability, ParticipationStatus};
    use chrono::{TimeZone, Utc};

    fn make_event() -> Event {
        Event {
            id: "evt-1".to_string(),
            calendar_id: "work".to_string(),
            title: "Standup".to_string(),
            start: Utc.with_ymd_and_hms(2025, 3, 20, 10, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2025, 3, 20, 11, 0, 0).unwrap(),
            all_day: false,
            notes: None,
            availability: Some(Availability::Busy),
            participant_status: Some(ParticipationStatus::Accepted),
            updated: None,
        }
    }

    fn make_record() -> TrackingRecord {
        TrackingRecord {
            source_hash: "958243e54ae93b5e".to_string(),
            source_calendar_id: "work".to_string(),
            source_event_id: "evt-1".to_string(),
            source_start: Some("2025-03-20T10:00:00Z".to_string()),
            tracking_id: "a1b2c3d4".to_string(),
        }
    }

    #[test]
    fn test_fingerprint_matches_reference_digest() {
        // sha256 of {"all_day":false,"availability":0,"end":"2025-03-20T11:00:00Z","participant_status":2,"start":"2025-03-20T10:00:00Z"}
        assert_eq!(fingerprint(&make_event()), "958243e54ae93b5e");
    }

    #[test]
    fn test_fingerprint_absent_fields_are_null() {
        let mut event = make_event();
        event.availability = None;
        event.participant_status = None;
        assert_eq!(fingerprint(&event), "437ff63874cf2948");
    }

    #[test]
    fn test_fingerprint_ignores_title_and_notes() {
        let mut event = make_event();
        let before = fingerprint(&event);
        event.title = "Renamed".to_string();
        event.notes = Some("agenda".to_string());
        event.id = "other".to_string();
        assert_eq!(fingerprint(&event), before);
    }

    #[test]
    fn test_fingerprint_changes_with_each_field() {
        let base = fingerprint(&make_event());

        let mut e = make_event();
        e.all_day = true;
        assert_ne!(fingerprint(&e), base);

        let mut e = make_event();
        e.availability = Some(Availability::Tentative);
        assert_ne!(fingerprint(&e), base);

        let mut e = make_event();
        e.end = Utc.with_ymd_and_hms(2025, 3, 20, 11, 30, 0).unwrap();
        assert_ne!(fingerprint(&e), base);

        let mut e = make_event();
        e.participant_status = None;
        assert_ne!(fingerprint(&e), base);

        let mut e = make_event();
        e.start = Utc.with_ymd_and_hms(2025, 3, 20, 9, 0, 0).unwrap();
        assert_ne!(fingerprint(&e), base);
    }

    #[test]
    fn test_encode_marker_wire_format() {
        let notes = encode_marker(&make_record()).unwrap();
        assert_eq!(
            notes,
            r#"[CALSYNC:{"hash":"958243e54ae93b5e","scal":"work","src":"evt-1","sstart":"2025-03-20T10:00:00Z","tid":"a1b2c3d4"}]"#
        );
    }

    #[test]
    fn test_encode_marker_omits_absent_source_start() {
        let mut record = make_record();
        record.source_start = None;
        let notes = encode_marker(&record).unwrap();
        assert!(!notes.contains("sstart"), "Got: {}", notes);
        assert_eq!(decode_marker(&notes), Some(record));
    }

    #[test]
    fn test_marker_roundtrip() {
        let record = make_record();
        let notes = encode_marker(&record).unwrap();
        assert_eq!(decode_marker(&notes), Some(record));
    }

    #[test]
    fn test_decode_marker_tolerates_surrounding_text() {
        let notes = format!(
            "Some user text\n{}\ntrailing",
            encode_marker(&make_record()).unwrap()
        );
        assert_eq!(decode_marker(&notes), Some(make_record()));
    }

    #[test]
    fn test_decode_marker_accepts_null_source_start() {
        let notes = r#"[CALSYNC:{"hash":"0123456789abcdef","scal":"a","src":"b","sstart":null,"tid":"t"}]"#;
        let record = decode_marker(notes).expect("Should decode");
        assert_eq!(record.source_start, None);
    }

    #[test]
    fn test_decode_marker_rejects_malformed() {
        assert_eq!(decode_marker("just a note"), None);
        assert_eq!(decode_marker(r#"[CALSYNC:{"hash":"x""#), None);
        assert_eq!(decode_marker("[CALSYNC:not json]"), None);
        assert_eq!(decode_marker(r#"[CALSYNC:{"hash":"x"}]"#), None);
    }

    #[test]
    fn test_is_placeholder_only_checks_prefix() {
        assert!(is_placeholder("[CALSYNC:garbage"));
        assert!(!is_placeholder("CALSYNC"));
    }

    #[test]
    fn test_occurrence_keys_disambiguate_instances() {
        let first = make_event();
        let mut second = make_event();
        second.start = Utc.with_ymd_and_hms(2025, 3, 27, 10, 0, 0).unwrap();

        assert_ne!(occurrence_key(&first), occurrence_key(&second));
        assert_eq!(occurrence_key(&first), "evt-12025-03-20T10:00:00Z");
    }

    #[test]
    fn test_occurrence_key_from_record_matches_source() {
        let event = make_event();
        let record = TrackingRecord::for_source(&event, new_tracking_id());
        assert_eq!(occurrence_key_from_record(&record), occurrence_key(&event));

        let legacy = TrackingRecord {
            source_start: None,
            ..record
        };
        assert_eq!(occurrence_key_from_record(&legacy), "evt-1");
    }

    #[test]
    fn test_new_tracking_id_is_short_hex() {
        let id = new_tracking_id();
        assert_eq!(id.len(), 8);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
