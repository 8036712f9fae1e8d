//! What a sync run did, per calendar pair.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::diff::{DiffKind, SyncAction};
use crate::sync::SyncWindow;

/// Source name used for orphan cleanup results.
pub const ORPHAN_CLEANUP: &str = "orphan-cleanup";

/// Outcome for one source/target pair (or one calendar, for fetch failures
/// and orphan cleanup).
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncResult {
    pub source: String,
    pub target: Option<String>,
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    pub errors: Vec<String>,
    /// Actions that were applied, or would have been in a dry run
    #[serde(skip)]
    pub actions: Vec<SyncAction>,
}

impl SyncResult {
    pub fn new(source: impl Into<String>, target: Option<&str>) -> Self {
        SyncResult {
            source: source.into(),
            target: target.map(str::to_string),
            ..Default::default()
        }
    }

    /// A calendar that could not be fetched at all.
    pub fn fetch_failed(calendar_id: &str, error: impl std::fmt::Display) -> Self {
        let mut result = SyncResult::new(calendar_id, None);
        result.errors.push(format!("fetch failed: {}", error));
        result
    }

    pub fn record(&mut self, action: SyncAction) {
        match action.kind() {
            DiffKind::Create => self.created += 1,
            DiffKind::Update => self.updated += 1,
            DiffKind::Delete => self.deleted += 1,
        }
        self.actions.push(action);
    }

    pub fn change_count(&self) -> usize {
        self.created + self.updated + self.deleted
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// "work -> home", or just the source when there is no target.
    pub fn label(&self) -> String {
        match &self.target {
            Some(target) => format!("{} -> {}", self.source, target),
            None => self.source.clone(),
        }
    }
}

/// Everything a single run produced.
#[derive(Debug, Clone, Serialize)]
pub struct SyncSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub window: SyncWindow,
    pub dry_run: bool,
    /// Set when a stop was requested and remaining pairs were skipped
    pub stopped_early: bool,
    pub results: Vec<SyncResult>,
}

impl SyncSummary {
    pub fn start(window: SyncWindow, dry_run: bool) -> Self {
        let now = Utc::now();
        SyncSummary {
            started_at: now,
            finished_at: now,
            window,
            dry_run,
            stopped_early: false,
            results: Vec::new(),
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Utc::now();
    }

    pub fn total_created(&self) -> usize {
        self.results.iter().map(|r| r.created).sum()
    }

    pub fn total_updated(&self) -> usize {
        self.results.iter().map(|r| r.updated).sum()
    }

    pub fn total_deleted(&self) -> usize {
        self.results.iter().map(|r| r.deleted).sum()
    }

    pub fn total_changes(&self) -> usize {
        self.results.iter().map(SyncResult::change_count).sum()
    }

    pub fn has_errors(&self) -> bool {
        self.results.iter().any(SyncResult::has_errors)
    }

    /// Every error, prefixed with the pair it came from.
    pub fn all_errors(&self) -> Vec<String> {
        self.results
            .iter()
            .flat_map(|r| r.errors.iter().map(move |e| format!("{}: {}", r.label(), e)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Event;
    use chrono::TimeZone;

    fn make_event(id: &str) -> Event {
        Event {
            id: id.to_string(),
            calendar_id: "work".to_string(),
            title: "Standup".to_string(),
            start: Utc.with_ymd_and_hms(2025, 3, 20, 9, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2025, 3, 20, 9, 15, 0).unwrap(),
            all_day: false,
            notes: None,
            availability: None,
            participant_status: None,
            updated: None,
        }
    }

    fn make_window() -> SyncWindow {
        let start = Utc.with_ymd_and_hms(2025, 3, 20, 0, 0, 0).unwrap();
        SyncWindow::resolve(Some(start), None, 7)
    }

    fn create(id: &str) -> SyncAction {
        SyncAction::Create {
            source: make_event(id),
            reason: "new".into(),
        }
    }

    #[test]
    fn totals_add_up_across_results() {
        let mut summary = SyncSummary::start(make_window(), false);

        let mut a = SyncResult::new("work", Some("home"));
        a.record(create("1"));
        a.record(create("2"));

        let mut b = SyncResult::new(ORPHAN_CLEANUP, Some("home"));
        b.record(SyncAction::Delete {
            placeholder: make_event("3"),
            reason: "orphan".into(),
        });
        b.errors.push("delete failed".into());

        summary.results.push(a);
        summary.results.push(b);

        assert_eq!(summary.total_created(), 2);
        assert_eq!(summary.total_updated(), 0);
        assert_eq!(summary.total_deleted(), 1);
        assert_eq!(summary.total_changes(), 3);
        assert!(summary.has_errors());
        assert_eq!(summary.all_errors(), vec!["orphan-cleanup -> home: delete failed"]);
    }

    #[test]
    fn fetch_failures_have_no_target() {
        let result = SyncResult::fetch_failed("broken", "Calendar not found: broken");
        assert_eq!(result.label(), "broken");
        assert_eq!(result.errors, vec!["fetch failed: Calendar not found: broken"]);
        assert_eq!(result.change_count(), 0);
    }

    #[test]
    fn serializes_counts_without_actions() {
        let mut result = SyncResult::new("work", Some("home"));
        result.record(create("1"));

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["created"], 1);
        assert_eq!(json["target"], "home");
        assert!(json.get("actions").is_none());
    }
}
