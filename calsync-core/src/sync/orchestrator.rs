//! Drives one reconciliation run across a set of calendars.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::backend::CalendarBackend;
use crate::config::SyncConfig;
use crate::diff::{SyncAction, compute_sync_actions};
use crate::error::{CalSyncError, CalSyncResult};
use crate::event::Event;
use crate::sync::placeholder::{new_placeholder, placeholder_update};
use crate::sync::{ORPHAN_CLEANUP, SyncResult, SyncSummary, SyncWindow};
use crate::tracking::decode_marker;

const DEFAULT_PLACEHOLDER_TITLE: &str = "Busy";
const DEFAULT_LOOKAHEAD_DAYS: u32 = 30;

/// Asks a running [`Orchestrator`] to stop after its current calendar pair.
#[derive(Debug, Clone)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn request_stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

/// Mirrors busy time between every ordered pair of participating calendars.
///
/// Only one run may be in flight per orchestrator; a second concurrent
/// [`run`](Orchestrator::run) fails with [`CalSyncError::AlreadyRunning`].
pub struct Orchestrator<B: CalendarBackend> {
    backend: B,
    placeholder_title: String,
    lookahead_days: u32,
    run_lock: Mutex<()>,
    stop_requested: Arc<AtomicBool>,
}

impl<B: CalendarBackend> Orchestrator<B> {
    pub fn new(backend: B) -> Self {
        Orchestrator {
            backend,
            placeholder_title: DEFAULT_PLACEHOLDER_TITLE.to_string(),
            lookahead_days: DEFAULT_LOOKAHEAD_DAYS,
            run_lock: Mutex::new(()),
            stop_requested: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn from_config(backend: B, config: &SyncConfig) -> Self {
        Self::new(backend)
            .with_placeholder_title(&config.placeholder_title)
            .with_lookahead_days(config.lookahead_days)
    }

    pub fn with_placeholder_title(mut self, title: &str) -> Self {
        self.placeholder_title = title.to_string();
        self
    }

    pub fn with_lookahead_days(mut self, days: u32) -> Self {
        self.lookahead_days = days;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Ask an in-flight run to stop after the pair it is working on.
    pub fn request_stop(&self) {
        self.stop_handle().request_stop();
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle(Arc::clone(&self.stop_requested))
    }

    /// Reconcile `calendar_ids` with each other over the given window.
    ///
    /// Missing window bounds default to the start of today and
    /// `lookahead_days` after the start. With `dry_run`, actions are counted
    /// but nothing is written.
    ///
    /// Only refused access, fewer than two calendars, or a concurrent run
    /// fail the whole call. Everything else is recorded in the summary.
    pub async fn run(
        &self,
        calendar_ids: &[String],
        window_start: Option<DateTime<Utc>>,
        window_end: Option<DateTime<Utc>>,
        dry_run: bool,
    ) -> CalSyncResult<SyncSummary> {
        let _running = self
            .run_lock
            .try_lock()
            .map_err(|_| CalSyncError::AlreadyRunning)?;
        self.stop_requested.store(false, Ordering::SeqCst);

        let calendar_ids = dedupe(calendar_ids);
        if calendar_ids.len() < 2 {
            return Err(CalSyncError::NotEnoughCalendars(calendar_ids.len()));
        }

        if !self.backend.request_access().await? {
            return Err(CalSyncError::AccessDenied(
                "calendar access was not granted".to_string(),
            ));
        }

        let window = SyncWindow::resolve(window_start, window_end, self.lookahead_days);
        let mut summary = SyncSummary::start(window, dry_run);

        info!(
            calendars = calendar_ids.len(),
            start = %window.start,
            end = %window.end,
            dry_run,
            "Starting sync run"
        );

        let mut fetched = Vec::new();
        let mut events: HashMap<String, Vec<Event>> = HashMap::new();

        for calendar_id in &calendar_ids {
            match self.fetch(calendar_id, &window).await {
                Ok(calendar_events) => {
                    debug!(
                        calendar = %calendar_id,
                        events = calendar_events.len(),
                        "Fetched events"
                    );
                    fetched.push(calendar_id.clone());
                    events.insert(calendar_id.clone(), calendar_events);
                }
                Err(e) => {
                    warn!(
                        calendar = %calendar_id,
                        error = %e,
                        "Failed to fetch calendar, skipping it"
                    );
                    summary.results.push(SyncResult::fetch_failed(calendar_id, e));
                }
            }
        }

        self.clean_orphans(&calendar_ids, &fetched, &mut events, &window, dry_run, &mut summary)
            .await;

        'pairs: for source in &fetched {
            for target in &fetched {
                if source == target {
                    continue;
                }
                if self.stop_requested.load(Ordering::SeqCst) {
                    info!("Stop requested, skipping remaining calendar pairs");
                    summary.stopped_early = true;
                    break 'pairs;
                }

                let actions = match (events.get(source), events.get(target)) {
                    (Some(source_events), Some(target_events)) => {
                        compute_sync_actions(source_events, target_events, source)
                    }
                    _ => continue,
                };

                let mut result = SyncResult::new(source.as_str(), Some(target.as_str()));
                let attempted = !actions.is_empty();

                for action in actions {
                    self.apply(action, target, dry_run, &mut result).await;
                }

                if attempted && !dry_run {
                    self.refresh(target, &window, &mut events, &mut result).await;
                }

                if result.change_count() > 0 || result.has_errors() {
                    info!(
                        pair = %result.label(),
                        created = result.created,
                        updated = result.updated,
                        deleted = result.deleted,
                        errors = result.errors.len(),
                        "Synced pair"
                    );
                }
                summary.results.push(result);
            }
        }

        summary.finish();
        info!(
            created = summary.total_created(),
            updated = summary.total_updated(),
            deleted = summary.total_deleted(),
            errors = summary.all_errors().len(),
            "Sync run finished"
        );

        Ok(summary)
    }

    async fn fetch(&self, calendar_id: &str, window: &SyncWindow) -> CalSyncResult<Vec<Event>> {
        self.backend
            .get_events(calendar_id, window.start, window.end)
            .await
    }

    /// Delete placeholders whose source calendar is no longer participating.
    async fn clean_orphans(
        &self,
        calendar_ids: &[String],
        fetched: &[String],
        events: &mut HashMap<String, Vec<Event>>,
        window: &SyncWindow,
        dry_run: bool,
        summary: &mut SyncSummary,
    ) {
        let participating: HashSet<&str> = calendar_ids.iter().map(String::as_str).collect();

        for target in fetched {
            let orphans: Vec<Event> = events
                .get(target)
                .map(|target_events| {
                    target_events
                        .iter()
                        .filter(|e| {
                            decode_marker(e.notes()).is_some_and(|record| {
                                !participating.contains(record.source_calendar_id.as_str())
                            })
                        })
                        .cloned()
                        .collect()
                })
                .unwrap_or_default();

            if orphans.is_empty() {
                continue;
            }

            info!(calendar = %target, orphans = orphans.len(), "Removing orphaned placeholders");
            let mut result = SyncResult::new(ORPHAN_CLEANUP, Some(target.as_str()));

            for placeholder in orphans {
                let action = SyncAction::Delete {
                    placeholder,
                    reason: "source calendar no longer synced".to_string(),
                };
                self.apply(action, target, dry_run, &mut result).await;
            }

            if !dry_run {
                self.refresh(target, window, events, &mut result).await;
            }
            summary.results.push(result);
        }
    }

    /// Apply one action to `target`, recording success or failure in `result`.
    async fn apply(
        &self,
        action: SyncAction,
        target: &str,
        dry_run: bool,
        result: &mut SyncResult,
    ) {
        let kind = action.kind();
        debug!(target_calendar = %target, dry_run, "{}", action);

        if dry_run {
            result.record(action);
            return;
        }

        let outcome = match &action {
            SyncAction::Create { source, .. } => self.create_placeholder(source, target).await,
            SyncAction::Update {
                source,
                placeholder,
                ..
            } => self.update_placeholder(source, placeholder).await,
            SyncAction::Delete { placeholder, .. } => {
                self.backend.delete_event(&placeholder.id).await.map(|existed| {
                    if !existed {
                        debug!(event_id = %placeholder.id, "Placeholder was already gone");
                    }
                })
            }
        };

        match outcome {
            Ok(()) => result.record(action),
            Err(e) => {
                warn!(
                    target_calendar = %target,
                    error = %e,
                    "Failed to {} placeholder",
                    kind.name()
                );
                result
                    .errors
                    .push(format!("{} '{}' failed: {}", kind.name(), action.event(), e));
            }
        }
    }

    async fn create_placeholder(&self, source: &Event, target: &str) -> CalSyncResult<()> {
        let new_event = new_placeholder(source, target, &self.placeholder_title)?;
        self.backend.create_event(new_event).await?;
        Ok(())
    }

    async fn update_placeholder(&self, source: &Event, placeholder: &Event) -> CalSyncResult<()> {
        let update = placeholder_update(source, placeholder)?;
        self.backend.update_event(&placeholder.id, update).await?;
        Ok(())
    }

    /// Re-read a calendar after writing to it. On failure the stale snapshot
    /// is kept and the error is recorded against `result`.
    async fn refresh(
        &self,
        calendar_id: &str,
        window: &SyncWindow,
        events: &mut HashMap<String, Vec<Event>>,
        result: &mut SyncResult,
    ) {
        match self.fetch(calendar_id, window).await {
            Ok(fresh) => {
                events.insert(calendar_id.to_string(), fresh);
            }
            Err(e) => {
                warn!(calendar = %calendar_id, error = %e, "Failed to re-fetch calendar");
                result.errors.push(format!("re-fetch of '{}' failed: {}", calendar_id, e));
            }
        }
    }
}

/// Drop repeated ids, keeping first occurrences in order.
fn dedupe(calendar_ids: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    calendar_ids
        .iter()
        .filter(|id| seen.insert(id.as_str()))
        .cloned()
        .collect()
}
