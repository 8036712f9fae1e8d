//! Placeholder diff between one source calendar and one target calendar.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};

use tracing::warn;

use crate::diff::{SyncAction, is_eligible};
use crate::event::Event;
use crate::tracking::{
    TrackingRecord, decode_marker, fingerprint, occurrence_key, occurrence_key_from_record,
};

/// A placeholder in the target together with its decoded provenance.
struct Tracked<'a> {
    event: &'a Event,
    record: TrackingRecord,
}

/// Compute the actions that make `target_events` mirror `source_events`.
///
/// Creates and updates come first, in source order, then deletes in
/// occurrence-key order. Placeholders originating from other calendars are
/// left alone.
pub fn compute_sync_actions(
    source_events: &[Event],
    target_events: &[Event],
    source_calendar_id: &str,
) -> Vec<SyncAction> {
    let real_sources: Vec<&Event> = source_events.iter().filter(|e| is_eligible(e)).collect();

    let (placeholders, duplicates) = index_placeholders(target_events, source_calendar_id);

    let mut actions = Vec::new();

    for source in &real_sources {
        let key = occurrence_key(source);
        match placeholders.get(&key) {
            Some(tracked) => {
                let current = fingerprint(source);
                if current != tracked.record.source_hash {
                    actions.push(SyncAction::Update {
                        source: (*source).clone(),
                        placeholder: tracked.event.clone(),
                        reason: format!(
                            "source changed ({} -> {})",
                            short(&tracked.record.source_hash),
                            short(&current)
                        ),
                    });
                }
            }
            None => actions.push(SyncAction::Create {
                source: (*source).clone(),
                reason: "new source event".to_string(),
            }),
        }
    }

    let live_keys: HashSet<String> = real_sources.iter().map(|e| occurrence_key(e)).collect();

    for (key, tracked) in &placeholders {
        if !live_keys.contains(key) {
            actions.push(SyncAction::Delete {
                placeholder: tracked.event.clone(),
                reason: "source event deleted".to_string(),
            });
        }
    }

    for duplicate in duplicates {
        actions.push(SyncAction::Delete {
            placeholder: duplicate.clone(),
            reason: "duplicate placeholder".to_string(),
        });
    }

    actions
}

/// Index the target's placeholders from `source_calendar_id` by occurrence key.
///
/// When two placeholders claim the same occurrence, the most recently
/// modified one is kept and the rest are returned as duplicates.
fn index_placeholders<'a>(
    target_events: &'a [Event],
    source_calendar_id: &str,
) -> (BTreeMap<String, Tracked<'a>>, Vec<&'a Event>) {
    let mut placeholders: BTreeMap<String, Tracked<'a>> = BTreeMap::new();
    let mut duplicates = Vec::new();

    for event in target_events {
        let Some(record) = decode_marker(event.notes()) else {
            continue;
        };
        if record.source_calendar_id != source_calendar_id {
            continue;
        }

        let key = occurrence_key_from_record(&record);
        let tracked = Tracked { event, record };

        match placeholders.remove(&key) {
            None => {
                placeholders.insert(key, tracked);
            }
            Some(existing) => {
                let (keep, drop) = if is_newer(&tracked, &existing) {
                    (tracked, existing)
                } else {
                    (existing, tracked)
                };
                warn!(
                    key = %key,
                    kept = %keep.event.id,
                    dropped = %drop.event.id,
                    "Multiple placeholders track the same occurrence"
                );
                duplicates.push(drop.event);
                placeholders.insert(key, keep);
            }
        }
    }

    (placeholders, duplicates)
}

fn is_newer(a: &Tracked<'_>, b: &Tracked<'_>) -> bool {
    match a.event.updated.cmp(&b.event.updated) {
        Ordering::Greater => true,
        Ordering::Less => false,
        Ordering::Equal => a.event.id > b.event.id,
    }
}

fn short(hash: &str) -> &str {
    hash.get(..8).unwrap_or(hash)
}
