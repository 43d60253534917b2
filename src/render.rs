//! TUI rendering traits for calmerge types.
//!
//! Extension traits that add colored terminal rendering to calmerge-core
//! types using owo_colors.

use calmerge_core::{CalendarSourceHandle, ExtractionOutcome, SourceReport};
use owo_colors::OwoColorize;

use crate::utils::tui::pluralize;

/// Extension trait for TUI rendering with colors.
pub trait Render {
    fn render(&self) -> String;
}

impl Render for CalendarSourceHandle {
    fn render(&self) -> String {
        format!("📅 {}", self.display_name)
    }
}

impl Render for ExtractionOutcome {
    fn render(&self) -> String {
        match self {
            ExtractionOutcome::Primary(n) => {
                format!("{} {}", n, pluralize("event", *n)).green().to_string()
            }
            ExtractionOutcome::Fallback(n) => {
                let label = format!("{} {} (item-by-item)", n, pluralize("event", *n));
                label.yellow().to_string()
            }
            ExtractionOutcome::Failed(reason) => format!("failed: {reason}").red().to_string(),
        }
    }
}

impl Render for SourceReport {
    fn render(&self) -> String {
        let symbol = match self.outcome {
            ExtractionOutcome::Primary(_) => "✓".green().to_string(),
            ExtractionOutcome::Fallback(_) => "~".yellow().to_string(),
            ExtractionOutcome::Failed(_) => "✗".red().to_string(),
        };
        format!("{} {} {}", symbol, self.source.render(), self.outcome.render())
    }
}

/// A numbered line for source listings, with the identity dimmed.
pub fn render_numbered(index: usize, source: &CalendarSourceHandle) -> String {
    format!(
        "{:>3}. {} {}",
        index,
        source.render(),
        format!("({})", source.identity).dimmed()
    )
}
