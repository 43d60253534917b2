//! ICS parsing using the icalendar crate's parser.

use chrono::{DateTime, Duration, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use icalendar::parser::{Component, Property, read_calendar, unfold};
use icalendar::{CalendarDateTime, DatePerhapsTime};
use tracing::{debug, warn};

use crate::error::{CalMergeError, CalMergeResult};
use crate::event::EventRecord;
use crate::ics::SOURCE_PROPERTY;

/// Parse every VEVENT in a calendar document.
///
/// The outer error means the document itself is unreadable. Each inner
/// result is one VEVENT, so a single bad event does not spoil the rest.
/// `source_id` tags events unless they carry their own `X-CALMERGE-SOURCE`.
pub fn parse_events(
    content: &str,
    source_id: &str,
) -> CalMergeResult<Vec<CalMergeResult<EventRecord>>> {
    let trimmed = content.trim_start_matches('\u{feff}').trim_start();
    if !trimmed.to_ascii_uppercase().starts_with("BEGIN:VCALENDAR") {
        return Err(CalMergeError::IcsParse(
            "Document does not start with BEGIN:VCALENDAR".into(),
        ));
    }

    let unfolded = unfold(trimmed);
    let calendar = read_calendar(&unfolded).map_err(|e| CalMergeError::IcsParse(e.to_string()))?;

    Ok(calendar
        .components
        .iter()
        .filter(|c| c.name == "VEVENT")
        .map(|vevent| parse_vevent(vevent, source_id))
        .collect())
}

fn parse_vevent(vevent: &Component<'_>, source_id: &str) -> CalMergeResult<EventRecord> {
    let uid = vevent
        .find_prop("UID")
        .map(|p| p.val.to_string())
        .filter(|uid| !uid.is_empty());

    let start_prop = vevent.find_prop("DTSTART").ok_or_else(|| {
        CalMergeError::ItemMalformed(format!(
            "VEVENT {} has no DTSTART",
            uid.as_deref().unwrap_or("(no UID)")
        ))
    })?;
    let start_time = date_perhaps_time(start_prop)?;
    let start = to_utc(&start_time);

    let end = match vevent.find_prop("DTEND") {
        Some(prop) => to_utc(&date_perhaps_time(prop)?),
        // RFC 5545: no DTEND means one day for dates, zero length otherwise
        None => match start_time {
            DatePerhapsTime::Date(_) => start + Duration::days(1),
            DatePerhapsTime::DateTime(_) => start,
        },
    };

    let summary = vevent
        .find_prop("SUMMARY")
        .map(|p| p.val.to_string())
        .unwrap_or_default();
    let text = |name: &str| {
        vevent
            .find_prop(name)
            .map(|p| p.val.to_string())
            .filter(|s| !s.trim().is_empty())
    };
    let location = text("LOCATION");
    let description = text("DESCRIPTION");
    let source_id = vevent
        .find_prop(SOURCE_PROPERTY)
        .map(|p| p.val.to_string())
        .unwrap_or_else(|| source_id.to_string());

    Ok(EventRecord {
        uid: uid.unwrap_or_else(EventRecord::generate_uid),
        summary,
        start,
        end,
        location,
        description,
        source_id,
    })
}

fn date_perhaps_time(prop: &Property<'_>) -> CalMergeResult<DatePerhapsTime> {
    DatePerhapsTime::try_from(prop).map_err(|_| {
        CalMergeError::ItemMalformed(format!("Unreadable {} value '{}'", prop.name, prop.val))
    })
}

/// Normalize an ICS date or date-time to UTC.
///
/// Dates become midnight UTC. Floating times and times in a zone the IANA
/// database does not know are read as UTC.
pub fn to_utc(time: &DatePerhapsTime) -> DateTime<Utc> {
    match time {
        DatePerhapsTime::Date(d) => d.and_time(NaiveTime::MIN).and_utc(),
        DatePerhapsTime::DateTime(cal_dt) => match cal_dt {
            CalendarDateTime::Utc(dt) => *dt,
            CalendarDateTime::Floating(naive) => {
                debug!(%naive, "floating time read as UTC");
                naive.and_utc()
            }
            CalendarDateTime::WithTimezone { date_time, tzid } => zoned_to_utc(date_time, tzid),
        },
    }
}

fn zoned_to_utc(naive: &NaiveDateTime, tzid: &str) -> DateTime<Utc> {
    let Ok(tz) = tzid.parse::<Tz>() else {
        warn!(tzid, "unknown TZID, reading time as UTC");
        return naive.and_utc();
    };

    tz.from_local_datetime(naive)
        .earliest()
        // Local time falls in a DST gap: use the instant just after it
        .or_else(|| tz.from_local_datetime(&(*naive + Duration::hours(1))).earliest())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| naive.and_utc())
}
