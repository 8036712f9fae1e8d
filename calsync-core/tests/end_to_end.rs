use calsync_core::ics::generate_ics;
use calsync_core::sync::ORPHAN_CLEANUP;
use calsync_core::tracking::{decode_marker, fingerprint, is_placeholder};
use calsync_core::{
    Availability, CalendarConfig, Event, LocalBackend, MemoryBackend, Orchestrator,
    ParticipationStatus, SyncResult, SyncSummary,
};
use chrono::{DateTime, Duration, TimeZone, Utc};

fn window() -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
    let start = Utc.with_ymd_and_hms(2025, 3, 20, 0, 0, 0).unwrap();
    (Some(start), Some(start + Duration::days(7)))
}

fn ids(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn meeting(calendar_id: &str, id: &str) -> Event {
    Event {
        id: id.to_string(),
        calendar_id: calendar_id.to_string(),
        title: "Quarterly review".to_string(),
        start: Utc.with_ymd_and_hms(2025, 3, 20, 10, 0, 0).unwrap(),
        end: Utc.with_ymd_and_hms(2025, 3, 20, 11, 0, 0).unwrap(),
        all_day: false,
        notes: Some("Room 4, bring numbers".to_string()),
        availability: Some(Availability::Busy),
        participant_status: Some(ParticipationStatus::Accepted),
        updated: None,
    }
}

fn pair<'a>(summary: &'a SyncSummary, source: &str, target: &str) -> &'a SyncResult {
    summary
        .results
        .iter()
        .find(|r| r.source == source && r.target.as_deref() == Some(target))
        .unwrap_or_else(|| panic!("No result for {} -> {}", source, target))
}

#[tokio::test]
async fn create_then_idle_then_update() {
    let backend = MemoryBackend::new();
    backend.add_calendar("a", "A");
    backend.add_calendar("b", "B");
    let mut x = meeting("a", "x");
    backend.upsert_event(x.clone()).unwrap();

    let orchestrator = Orchestrator::new(backend);
    let calendars = ids(&["a", "b"]);
    let (start, end) = window();

    // First run mirrors X into B
    let summary = orchestrator
        .run(&calendars, start, end, false)
        .await
        .unwrap();
    assert_eq!(pair(&summary, "a", "b").created, 1);
    assert_eq!(pair(&summary, "b", "a").change_count(), 0);

    let placeholders = orchestrator.backend().events("b");
    assert_eq!(placeholders.len(), 1);
    let record = decode_marker(placeholders[0].notes()).expect("Placeholder should carry a marker");
    assert_eq!(record.source_event_id, "x");
    assert_eq!(record.source_calendar_id, "a");
    assert_eq!(record.source_hash, fingerprint(&x));
    assert!(!placeholders[0].notes().contains("Room 4"));

    // Nothing changed
    let summary = orchestrator
        .run(&calendars, start, end, false)
        .await
        .unwrap();
    assert_eq!(pair(&summary, "a", "b").change_count(), 0);
    assert_eq!(summary.total_changes(), 0);

    // X runs 30 minutes longer
    x.end = Utc.with_ymd_and_hms(2025, 3, 20, 11, 30, 0).unwrap();
    orchestrator.backend().upsert_event(x.clone()).unwrap();

    let summary = orchestrator
        .run(&calendars, start, end, false)
        .await
        .unwrap();
    assert_eq!(pair(&summary, "a", "b").updated, 1);
    assert_eq!(pair(&summary, "b", "a").change_count(), 0);

    let placeholders = orchestrator.backend().events("b");
    assert_eq!(placeholders.len(), 1);
    assert_eq!(placeholders[0].end, x.end);
    let updated = decode_marker(placeholders[0].notes()).unwrap();
    assert_eq!(updated.source_hash, fingerprint(&x));
    assert_ne!(updated.source_hash, record.source_hash);
    assert_eq!(updated.tracking_id, record.tracking_id);
}

#[tokio::test]
async fn source_deletion_removes_placeholder() {
    let backend = MemoryBackend::new();
    backend.add_calendar("a", "A");
    backend.add_calendar("b", "B");
    backend.upsert_event(meeting("a", "x")).unwrap();

    let orchestrator = Orchestrator::new(backend);
    let calendars = ids(&["a", "b"]);
    let (start, end) = window();

    orchestrator
        .run(&calendars, start, end, false)
        .await
        .unwrap();
    assert_eq!(orchestrator.backend().events("b").len(), 1);

    orchestrator.backend().remove_event("a", "x");
    let summary = orchestrator
        .run(&calendars, start, end, false)
        .await
        .unwrap();

    assert_eq!(pair(&summary, "a", "b").deleted, 1);
    assert!(orchestrator.backend().events("b").is_empty());
}

#[tokio::test]
async fn three_calendars_converge_in_one_run() {
    let backend = MemoryBackend::new();
    for id in ["a", "b", "c"] {
        backend.add_calendar(id, id);
    }
    backend.upsert_event(meeting("a", "x")).unwrap();
    let mut y = meeting("c", "y");
    y.start = Utc.with_ymd_and_hms(2025, 3, 21, 14, 0, 0).unwrap();
    y.end = Utc.with_ymd_and_hms(2025, 3, 21, 15, 0, 0).unwrap();
    backend.upsert_event(y).unwrap();

    let orchestrator = Orchestrator::new(backend);
    let calendars = ids(&["a", "b", "c"]);
    let (start, end) = window();

    let first = orchestrator
        .run(&calendars, start, end, false)
        .await
        .unwrap();
    assert_eq!(first.total_created(), 4);
    assert!(!first.has_errors());

    // Every calendar holds its own event plus one placeholder per foreign event
    assert_eq!(orchestrator.backend().events("a").len(), 2);
    assert_eq!(orchestrator.backend().events("b").len(), 2);
    assert_eq!(orchestrator.backend().events("c").len(), 2);

    let second = orchestrator
        .run(&calendars, start, end, false)
        .await
        .unwrap();
    assert_eq!(second.total_changes(), 0);
}

#[tokio::test]
async fn removed_calendar_leaves_no_orphans() {
    let backend = MemoryBackend::new();
    for id in ["a", "b", "c"] {
        backend.add_calendar(id, id);
    }
    backend.upsert_event(meeting("c", "z")).unwrap();

    let orchestrator = Orchestrator::new(backend);
    let (start, end) = window();

    orchestrator
        .run(&ids(&["a", "b", "c"]), start, end, false)
        .await
        .unwrap();
    assert_eq!(orchestrator.backend().events("a").len(), 1);

    // "c" leaves the set; its event still exists, but the placeholders must go
    let summary = orchestrator
        .run(&ids(&["a", "b"]), start, end, false)
        .await
        .unwrap();

    let cleanups: Vec<_> = summary
        .results
        .iter()
        .filter(|r| r.source == ORPHAN_CLEANUP)
        .collect();
    assert_eq!(cleanups.len(), 2);
    assert_eq!(summary.total_deleted(), 2);
    assert!(orchestrator.backend().events("a").is_empty());
    assert!(orchestrator.backend().events("b").is_empty());
    assert_eq!(orchestrator.backend().events("c").len(), 1);
}

#[tokio::test]
async fn ineligible_events_are_not_mirrored() {
    let backend = MemoryBackend::new();
    backend.add_calendar("a", "A");
    backend.add_calendar("b", "B");

    let mut free = meeting("a", "free");
    free.availability = Some(Availability::Free);
    let mut declined = meeting("a", "declined");
    declined.participant_status = Some(ParticipationStatus::Declined);
    let mut pending = meeting("a", "pending");
    pending.participant_status = Some(ParticipationStatus::Pending);
    let mut tentative = meeting("a", "tentative");
    tentative.participant_status = Some(ParticipationStatus::Tentative);

    for event in [free, declined, pending, tentative] {
        backend.upsert_event(event).unwrap();
    }

    let orchestrator = Orchestrator::new(backend);
    let (start, end) = window();
    let summary = orchestrator
        .run(&ids(&["a", "b"]), start, end, false)
        .await
        .unwrap();

    assert_eq!(summary.total_created(), 1);
    let placeholders = orchestrator.backend().events("b");
    assert_eq!(placeholders.len(), 1);
    assert_eq!(placeholders[0].availability, Some(Availability::Tentative));
}

#[tokio::test]
async fn dry_run_previews_without_side_effects() {
    let backend = MemoryBackend::new();
    backend.add_calendar("a", "A");
    backend.add_calendar("b", "B");
    backend.upsert_event(meeting("a", "x")).unwrap();

    let orchestrator = Orchestrator::new(backend);
    let (start, end) = window();
    let summary = orchestrator
        .run(&ids(&["a", "b"]), start, end, true)
        .await
        .unwrap();

    assert_eq!(pair(&summary, "a", "b").created, 1);
    assert_eq!(pair(&summary, "a", "b").actions.len(), 1);
    assert!(orchestrator.backend().events("b").is_empty());
}

#[tokio::test]
async fn local_calendars_sync_through_ics_files() {
    let dir = tempfile::tempdir().unwrap();
    let work = dir.path().join("work");
    let home = dir.path().join("home");
    std::fs::create_dir_all(&work).unwrap();
    std::fs::create_dir_all(&home).unwrap();

    let owner = CalendarConfig {
        name: Some("Work".to_string()),
        owner_email: Some("me@example.com".to_string()),
        read_only: false,
    };
    owner.save(&work).unwrap();

    let x = meeting("work", "x@example.com");
    std::fs::write(
        work.join("2025-03-20T1000__quarterly-review.ics"),
        generate_ics(&x, Some("me@example.com")),
    )
    .unwrap();

    let orchestrator = Orchestrator::new(LocalBackend::new(dir.path()));
    let calendars = ids(&["work", "home"]);
    let (start, end) = window();

    let summary = orchestrator
        .run(&calendars, start, end, false)
        .await
        .unwrap();
    assert_eq!(summary.total_created(), 1, "errors: {:?}", summary.all_errors());

    let written: Vec<_> = std::fs::read_dir(&home)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "ics"))
        .collect();
    assert_eq!(written.len(), 1);

    let content = std::fs::read_to_string(written[0].path()).unwrap();
    let placeholder = calsync_core::ics::parse_event(&content, "home", None).unwrap();
    assert!(is_placeholder(placeholder.notes()));
    assert_eq!(placeholder.title, "Busy");
    assert_eq!(placeholder.start, x.start);

    let again = orchestrator
        .run(&calendars, start, end, false)
        .await
        .unwrap();
    assert_eq!(again.total_changes(), 0, "errors: {:?}", again.all_errors());
}
