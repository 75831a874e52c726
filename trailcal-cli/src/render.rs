//! TUI rendering traits for trailcal types.
//!
//! This module provides extension traits that add colored terminal rendering
//! to trailcal-core types using owo_colors.

use owo_colors::OwoColorize;
use trailcal_core::DeclaredEvent;
use trailcal_core::diff::{DiffKind, EventDiff, FieldChange, SyncPlan};
use trailcal_core::reconcile::{ReportItem, SyncReport};

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

/// Start time as the race list declares it.
pub fn render_event_time(event: &DeclaredEvent) -> String {
    event.start.format("%a %b %-d %Y, %H:%M %:z").to_string()
}

impl Render for EventDiff {
    fn render(&self) -> String {
        let name = colorize_diff(self.kind, &self.event.name);
        let time = render_event_time(&self.event);

        format!("{} {} {}", self.kind.render(), name, time.dimmed())
    }
}

impl Render for FieldChange {
    fn render(&self) -> String {
        let old = self.old.as_deref().unwrap_or("(none)");
        let new = self.new.as_deref().unwrap_or("(none)");
        format!(
            "{}: {} → {}",
            self.field.to_string().dimmed(),
            old.red(),
            new.green()
        )
    }
}

/// Threshold for compact view (show counts instead of individual events)
const COMPACT_THRESHOLD: usize = 5;

/// Render a list of diffs, using compact view if there are many events and full is false
fn render_diff_list(diffs: &[EventDiff], full: bool, lines: &mut Vec<String>) {
    if diffs.is_empty() {
        return;
    }

    if full || diffs.len() <= COMPACT_THRESHOLD {
        for diff in diffs {
            lines.push(format!("   {}", diff.render()));
            lines.extend(diff.changes.iter().map(|c| format!("      {}", c.render())));
        }
    } else {
        let kind = diffs[0].kind;
        let verb = match kind {
            DiffKind::Create => "new",
            DiffKind::Update => "changed",
            DiffKind::Delete => "orphaned",
        };
        let label = format!("({} {} {})", diffs.len(), verb, pluralize("race", diffs.len()));
        lines.push(format!("   {} {}", kind.render(), colorize_diff(kind, &label)));
    }
}

/// Simple pluralization helper
fn pluralize(word: &str, count: usize) -> String {
    if count == 1 {
        word.to_string()
    } else {
        format!("{word}s")
    }
}

pub fn render_plan(plan: &SyncPlan, full: bool) -> String {
    if plan.is_empty() {
        return format!(
            "   {}",
            format!("No changes ({} unchanged)", plan.unchanged.len()).dimmed()
        );
    }

    let mut lines = Vec::new();
    render_diff_list(&plan.to_create, full, &mut lines);
    render_diff_list(&plan.to_update, full, &mut lines);
    render_diff_list(&plan.to_delete, full, &mut lines);

    if !plan.unchanged.is_empty() {
        lines.push(format!(
            "   {}",
            format!("{} unchanged", plan.unchanged.len()).dimmed()
        ));
    }

    lines.join("\n")
}

fn render_items(label: &str, items: &[ReportItem], lines: &mut Vec<String>) {
    for item in items {
        lines.push(format!(
            "   {} {} {}",
            label,
            item.name,
            item.key.as_str().dimmed()
        ));
    }
}

impl Render for SyncReport {
    fn render(&self) -> String {
        let counts = self.counts();
        let mut lines = vec![format!(
            "Synced: {} created, {} updated, {} deleted, {} unchanged",
            counts.created, counts.updated, counts.deleted, counts.unchanged
        )];

        if !self.skipped_past_orphans.is_empty() {
            lines.push(
                format!(
                    "Left {} past {} in place (no longer declared):",
                    counts.skipped_past_orphans,
                    pluralize("race", counts.skipped_past_orphans)
                )
                .yellow()
                .to_string(),
            );
            render_items(&"!".yellow().to_string(), &self.skipped_past_orphans, &mut lines);
        }

        if !self.failed.is_empty() {
            lines.push(
                format!(
                    "{} {} failed:",
                    counts.failed,
                    pluralize("item", counts.failed)
                )
                .red()
                .to_string(),
            );
            for failure in &self.failed {
                lines.push(format!("   {} {}", "✗".red(), failure.to_string().red()));
            }
        }

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use trailcal_core::identity::{Namespace, derive};

    fn create_diff(name: &str, day: u32) -> EventDiff {
        let event = DeclaredEvent::new(
            name,
            DateTime::parse_from_rfc3339(&format!("2025-06-{day:02}T08:00:00-05:00")).unwrap(),
        );
        let key = derive(&Namespace::default(), &event).unwrap();
        EventDiff::create(key, event)
    }

    #[test]
    fn test_small_plan_lists_each_race() {
        let plan = SyncPlan {
            to_create: vec![create_diff("Race A", 1), create_diff("Race B", 2)],
            ..SyncPlan::default()
        };

        let out = render_plan(&plan, false);
        assert!(out.contains("Race A"));
        assert!(out.contains("Race B"));
    }

    #[test]
    fn test_large_plan_is_compact_unless_full() {
        let plan = SyncPlan {
            to_create: (1..=7).map(|d| create_diff(&format!("Race {d}"), d)).collect(),
            ..SyncPlan::default()
        };

        let compact = render_plan(&plan, false);
        assert!(compact.contains("7 new races"));
        assert!(!compact.contains("Race 3"));

        let full = render_plan(&plan, true);
        assert!(full.contains("Race 3"));
    }

    #[test]
    fn test_empty_plan() {
        let out = render_plan(&SyncPlan::default(), false);
        assert!(out.contains("No changes"));
    }
}
