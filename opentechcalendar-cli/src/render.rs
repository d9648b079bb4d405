//! Terminal rendering for import results.
//!
//! Extension traits that add colored output to core types using owo_colors.

use opentechcalendar_core::{EventFailure, ImportReport};
use owo_colors::OwoColorize;

/// Threshold for compact view (show counts instead of individual events)
const COMPACT_THRESHOLD: usize = 5;

pub trait Render {
    fn render(&self) -> String;
}

impl Render for EventFailure {
    fn render(&self) -> String {
        let id = self.event_id.as_deref().unwrap_or("(unknown event)");
        format!("{} {} {}", "!".red(), id.red(), self.error.to_string().dimmed())
    }
}

impl Render for ImportReport {
    fn render(&self) -> String {
        let mut lines = vec![self.group_id.bold().to_string()];

        if self.written.len() <= COMPACT_THRESHOLD {
            for id in &self.written {
                lines.push(format!("   {} {}", "+".green(), id.green()));
            }
        } else {
            let count = self.written.len();
            let label = format!("({} {} written)", count, pluralize("event", count));
            lines.push(format!("   {} {}", "+".green(), label.green()));
        }

        for failure in &self.failures {
            lines.push(format!("   {}", failure.render()));
        }

        if self.written.is_empty() && self.failures.is_empty() {
            lines.push(format!("   {}", "Nothing to import".dimmed()));
        }

        if self.rejected > 0 || self.skipped > 0 {
            lines.push(
                format!("   {} filtered out, {} skipped", self.rejected, self.skipped)
                    .dimmed()
                    .to_string(),
            );
        }

        lines.join("\n")
    }
}

fn pluralize(word: &str, count: usize) -> String {
    if count == 1 {
        word.to_string()
    } else {
        format!("{}s", word)
    }
}
