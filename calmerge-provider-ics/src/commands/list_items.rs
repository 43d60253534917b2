//! Enumerate the VEVENTs of one calendar file as raw items.
//!
//! Values are passed through as found. Times that can be read are rendered
//! as `YYYYMMDDTHHMMSSZ`; anything unreadable is left out for calmerge to
//! reject.

use anyhow::{Context, Result, anyhow};
use calmerge_core::event::{format_ics_utc, parse_utc_timestamp};
use calmerge_core::ics::to_utc;
use calmerge_core::provider::protocol::ListItems;
use calmerge_core::provider::{ItemQuery, RawItem};
use chrono::{DateTime, Duration, Utc};
use icalendar::DatePerhapsTime;
use icalendar::parser::{Component, read_calendar, unfold};
use tracing::debug;

use crate::calendar_file;
use crate::commands::source_path;

pub async fn handle(cmd: ListItems) -> Result<Vec<RawItem>> {
    let path = source_path(&cmd.source);
    let content = calendar_file::read(&path)?;

    let unfolded = unfold(&content);
    let calendar = read_calendar(&unfolded)
        .map_err(|e| anyhow!(e))
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    let items = calendar
        .components
        .iter()
        .filter(|c| c.name == "VEVENT")
        .map(raw_item)
        .collect();

    Ok(apply_query(items, &cmd.query))
}

fn raw_item(vevent: &Component<'_>) -> RawItem {
    let text = |name: &str| vevent.find_prop(name).map(|p| p.val.to_string());
    let time = |name: &str| {
        vevent
            .find_prop(name)
            .and_then(|p| DatePerhapsTime::try_from(p).ok())
    };

    if vevent.find_prop("RRULE").is_some() {
        debug!(uid = ?text("UID"), "recurring event listed once, occurrences are not expanded");
    }

    let start = time("DTSTART");
    let end = match (time("DTEND"), &start) {
        (Some(end), _) => Some(to_utc(&end)),
        (None, Some(start @ DatePerhapsTime::Date(_))) => Some(to_utc(start) + Duration::days(1)),
        (None, Some(start)) => Some(to_utc(start)),
        (None, None) => None,
    };

    RawItem {
        uid: text("UID"),
        summary: text("SUMMARY"),
        start: start.map(|s| format_ics_utc(&to_utc(&s))),
        end: end.map(|e| format_ics_utc(&e)),
        location: text("LOCATION"),
        description: text("DESCRIPTION"),
    }
}

/// Sort and restrict where item times can be read. Items with unreadable
/// times are kept, sorted last.
fn apply_query(mut items: Vec<RawItem>, query: &ItemQuery) -> Vec<RawItem> {
    let times = |item: &RawItem| -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let start = parse_utc_timestamp(item.start.as_deref()?)?;
        let end = parse_utc_timestamp(item.end.as_deref()?)?;
        Some((start, end))
    };

    if query.sort_by_start {
        items.sort_by_key(|item| {
            let start = item.start.as_deref().and_then(parse_utc_timestamp);
            (start.is_none(), start)
        });
    }

    items.retain(|item| match times(item) {
        Some((start, end)) => query.window.contains(start, end),
        None => true,
    });

    items
}
