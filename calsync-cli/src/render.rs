//! Colored terminal rendering for calsync-core types.

use calsync_core::diff::{DiffKind, SyncAction};
use calsync_core::{CalendarMetadata, Event, SyncResult, SyncSummary};
use chrono::Local;
use owo_colors::OwoColorize;

/// Extension trait for TUI rendering with colors.
pub trait Render {
    fn render(&self) -> String;
}

impl Render for DiffKind {
    fn render(&self) -> String {
        colorize_diff(*self, self.symbol())
    }
}

/// Colorize text according to the diff kind
fn colorize_diff(kind: DiffKind, text: &str) -> String {
    match kind {
        DiffKind::Create => text.green().to_string(),
        DiffKind::Update => text.yellow().to_string(),
        DiffKind::Delete => text.red().to_string(),
    }
}

fn render_event_time(event: &Event) -> String {
    let start = event.start.with_timezone(&Local);
    if event.all_day {
        start.format("%a %b %-d (all day)").to_string()
    } else {
        start.format("%a %b %-d %H:%M").to_string()
    }
}

impl Render for SyncAction {
    fn render(&self) -> String {
        let kind = self.kind();
        let event = self.event();
        format!(
            "{} {} {} {}",
            kind.render(),
            colorize_diff(kind, &event.to_string()),
            render_event_time(event).dimmed(),
            format!("({})", self.reason()).dimmed()
        )
    }
}

impl Render for CalendarMetadata {
    fn render(&self) -> String {
        if self.writable {
            format!("📅 {}", self.id)
        } else {
            format!("📅 {} {}", self.id, "(read-only)".dimmed())
        }
    }
}

/// Threshold for compact view (show counts instead of individual actions)
const COMPACT_THRESHOLD: usize = 5;

fn pluralize(word: &str, count: usize) -> String {
    if count == 1 {
        word.to_string()
    } else {
        format!("{}s", word)
    }
}

/// Render a result's actions, using compact view if there are many and verbose is false
fn render_action_list(result: &SyncResult, verbose: bool, lines: &mut Vec<String>) {
    if verbose || result.actions.len() <= COMPACT_THRESHOLD {
        for action in &result.actions {
            lines.push(format!("   {}", action.render()));
        }
        return;
    }

    if result.created > 0 {
        let noun = pluralize("placeholder", result.created);
        let label = format!("({} new {})", result.created, noun);
        lines.push(format!("   {} {}", "+".green(), label.green()));
    }
    if result.updated > 0 {
        let noun = pluralize("placeholder", result.updated);
        let label = format!("({} changed {})", result.updated, noun);
        lines.push(format!("   {} {}", "~".yellow(), label.yellow()));
    }
    if result.deleted > 0 {
        let noun = pluralize("placeholder", result.deleted);
        let label = format!("({} removed {})", result.deleted, noun);
        lines.push(format!("   {} {}", "-".red(), label.red()));
    }
}

/// Rendering that can switch between compact and full output
pub trait SummaryRender {
    fn render_with(&self, verbose: bool) -> String;
}

impl SummaryRender for SyncResult {
    fn render_with(&self, verbose: bool) -> String {
        let mut lines = vec![self.label().bold().to_string()];

        if self.actions.is_empty() && self.errors.is_empty() {
            lines.push("   No changes".dimmed().to_string());
        }
        render_action_list(self, verbose, &mut lines);
        for error in &self.errors {
            lines.push(format!("   {} {}", "✗".red(), error.red()));
        }

        lines.join("\n")
    }
}

impl SummaryRender for SyncSummary {
    fn render_with(&self, verbose: bool) -> String {
        // Pairs with nothing to report are only listed in verbose mode
        let blocks: Vec<String> = self
            .results
            .iter()
            .filter(|r| verbose || r.change_count() > 0 || r.has_errors())
            .map(|r| r.render_with(verbose))
            .collect();

        let mut out = if blocks.is_empty() {
            "Everything in sync".dimmed().to_string()
        } else {
            blocks.join("\n\n")
        };

        if self.total_changes() > 0 {
            let verb = if self.dry_run { "Would sync" } else { "Synced" };
            out.push_str(&format!(
                "\n\n{}: {} created, {} updated, {} deleted",
                verb,
                self.total_created(),
                self.total_updated(),
                self.total_deleted()
            ));
        }

        if self.stopped_early {
            let note = "Stopped before all calendar pairs were synced";
            out.push_str(&format!("\n{}", note.yellow()));
        }

        out
    }
}
