//! Normalized in-memory event record.

use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Basic-format UTC timestamp used in ICS output (`YYYYMMDDTHHMMSSZ`).
pub const ICS_UTC_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// One calendar event, normalized to UTC, tagged with the source it came from.
///
/// `start <= end` is expected but not enforced: whatever the source reported
/// is carried through unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Source UID when the source provided one, otherwise generated.
    pub uid: String,
    pub summary: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub location: Option<String>,
    pub description: Option<String>,
    /// Identity of the originating calendar source
    pub source_id: String,
}

impl EventRecord {
    /// Fresh UID for events whose source did not provide one.
    pub fn generate_uid() -> String {
        format!("{}@calmerge", uuid::Uuid::new_v4())
    }
}

impl fmt::Display for EventRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.summary.is_empty() {
            write!(f, "(No title)")
        } else {
            write!(f, "{}", self.summary)
        }
    }
}

/// Format a UTC timestamp as `YYYYMMDDTHHMMSSZ`.
pub fn format_ics_utc(dt: &DateTime<Utc>) -> String {
    dt.format(ICS_UTC_FORMAT).to_string()
}

/// Parse a timestamp as reported by a provider.
///
/// Accepts RFC 3339 (any offset, converted to UTC) and the basic ICS UTC form.
pub fn parse_utc_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, ICS_UTC_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}
