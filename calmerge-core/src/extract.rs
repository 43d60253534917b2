//! Per-source extraction: structured export first, item iteration second.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::date_window::DateWindow;
use crate::error::{CalMergeError, CalMergeResult};
use crate::event::{EventRecord, parse_utc_timestamp};
use crate::ics::parse_events;
use crate::provider::{CalendarProvider, ExportOptions, ItemQuery, RawItem};
use crate::source::CalendarSourceHandle;

/// How extraction went for one source. Used for reporting only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "path", content = "value", rename_all = "snake_case")]
pub enum ExtractionOutcome {
    /// Structured export succeeded with this many events
    Primary(usize),
    /// Structured export failed, item iteration recovered this many events
    Fallback(usize),
    /// Neither path produced events
    Failed(String),
}

impl ExtractionOutcome {
    pub fn event_count(&self) -> usize {
        match self {
            ExtractionOutcome::Primary(n) | ExtractionOutcome::Fallback(n) => *n,
            ExtractionOutcome::Failed(_) => 0,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ExtractionOutcome::Failed(_))
    }
}

impl fmt::Display for ExtractionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionOutcome::Primary(n) => write!(f, "{n} via structured export"),
            ExtractionOutcome::Fallback(n) => write!(f, "{n} via item iteration"),
            ExtractionOutcome::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

/// Extract the events of one source for `window`.
///
/// Never fails: every problem ends up in the returned outcome, so callers can
/// move on to the next source.
pub async fn extract<P: CalendarProvider>(
    provider: &P,
    source: &CalendarSourceHandle,
    window: &DateWindow,
) -> (Vec<EventRecord>, ExtractionOutcome) {
    let primary_error = match extract_structured(provider, source, window).await {
        Ok(events) => {
            let count = events.len();
            info!(source = %source, count, "extracted via structured export");
            return (events, ExtractionOutcome::Primary(count));
        }
        Err(e) => {
            warn!(source = %source, error = %e, "structured export failed, iterating items");
            e
        }
    };

    match extract_items(provider, source, window).await {
        Ok(events) if !events.is_empty() => {
            let count = events.len();
            info!(source = %source, count, "extracted via item iteration");
            (events, ExtractionOutcome::Fallback(count))
        }
        Ok(_) => {
            let reason = format!(
                "structured export failed ({primary_error}); item iteration found no events"
            );
            warn!(source = %source, "{reason}");
            (Vec::new(), ExtractionOutcome::Failed(reason))
        }
        Err(e) => {
            let reason =
                format!("structured export failed ({primary_error}); item iteration failed ({e})");
            warn!(source = %source, "{reason}");
            (Vec::new(), ExtractionOutcome::Failed(reason))
        }
    }
}

async fn extract_structured<P: CalendarProvider>(
    provider: &P,
    source: &CalendarSourceHandle,
    window: &DateWindow,
) -> CalMergeResult<Vec<EventRecord>> {
    let bytes = provider
        .export_structured(source, window, &ExportOptions::full())
        .await?;
    let content = String::from_utf8(bytes)
        .map_err(|e| CalMergeError::IcsParse(format!("Export is not valid UTF-8: {e}")))?;

    let events = parse_events(&content, &source.identity)?
        .into_iter()
        .filter_map(|parsed| match parsed {
            Ok(event) => Some(event),
            Err(e) => {
                warn!(source = %source, error = %e, "skipping exported event");
                None
            }
        })
        .collect();

    Ok(events)
}

async fn extract_items<P: CalendarProvider>(
    provider: &P,
    source: &CalendarSourceHandle,
    window: &DateWindow,
) -> CalMergeResult<Vec<EventRecord>> {
    let items = provider.list_items(source, &ItemQuery::new(*window)).await?;

    let mut events: Vec<EventRecord> = items
        .into_iter()
        .filter_map(|item| match record_from_item(item, &source.identity) {
            Ok(event) => Some(event),
            Err(e) => {
                warn!(source = %source, error = %e, "skipping item");
                None
            }
        })
        .collect();

    // Stable, so items sharing a start keep the provider's order
    events.sort_by_key(|event| event.start);
    events.retain(|event| window.contains(event.start, event.end));

    Ok(events)
}

/// Convert one raw item into an event record.
///
/// Start and end are required. Empty location or description count as absent.
pub fn record_from_item(item: RawItem, source_id: &str) -> CalMergeResult<EventRecord> {
    let label = item
        .uid
        .clone()
        .or_else(|| item.summary.clone())
        .unwrap_or_else(|| "(unnamed item)".to_string());

    let start = required_timestamp(item.start.as_deref(), "start", &label)?;
    let end = required_timestamp(item.end.as_deref(), "end", &label)?;

    Ok(EventRecord {
        uid: item
            .uid
            .filter(|uid| !uid.trim().is_empty())
            .unwrap_or_else(EventRecord::generate_uid),
        summary: item.summary.unwrap_or_default(),
        start,
        end,
        location: item.location.filter(|s| !s.trim().is_empty()),
        description: item.description.filter(|s| !s.trim().is_empty()),
        source_id: source_id.to_string(),
    })
}

fn required_timestamp(
    value: Option<&str>,
    field: &str,
    label: &str,
) -> CalMergeResult<chrono::DateTime<chrono::Utc>> {
    let value = value
        .ok_or_else(|| CalMergeError::ItemMalformed(format!("{label}: missing {field}")))?;
    parse_utc_timestamp(value).ok_or_else(|| {
        CalMergeError::ItemMalformed(format!("{label}: unreadable {field} '{value}'"))
    })
}
