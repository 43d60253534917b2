//! Write the events of one calendar file that overlap a window to the
//! caller's staging path.

use anyhow::{Context, Result};
use calmerge_core::ics::{generate_ics, parse_events};
use calmerge_core::provider::CalendarDetail;
use calmerge_core::provider::protocol::ExportStructured;
use calmerge_core::{EventRecord, MergedCalendar};
use tracing::warn;

use crate::calendar_file;
use crate::commands::source_path;

pub async fn handle(cmd: ExportStructured) -> Result<()> {
    let path = source_path(&cmd.source);
    let content = calendar_file::read(&path)?;

    let parsed = parse_events(&content, &cmd.source.identity)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    let mut events = Vec::new();
    for result in parsed {
        match result {
            Ok(event) if cmd.window.overlaps(event.start, event.end) => {
                events.push(apply_detail(event, cmd.options.detail));
            }
            Ok(_) => {}
            Err(e) => warn!(path = %path.display(), "skipping event: {}", e),
        }
    }

    let calendar = MergedCalendar::from_events(Some(cmd.source.display_name.clone()), events);

    std::fs::write(&cmd.output_path, generate_ics(&calendar))
        .with_context(|| format!("Failed to write {}", cmd.output_path.display()))?;

    Ok(())
}

fn apply_detail(mut event: EventRecord, detail: CalendarDetail) -> EventRecord {
    match detail {
        CalendarDetail::FullDetails => {}
        CalendarDetail::LimitedDetails => {
            event.location = None;
            event.description = None;
        }
        CalendarDetail::FreeBusyOnly => {
            event.summary = "Busy".to_string();
            event.location = None;
            event.description = None;
        }
    }
    event
}
