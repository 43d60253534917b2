//! ICS generation.

use std::borrow::Cow;

use icalendar::{Calendar, Component, EventLike};

use crate::event::format_ics_utc;
use crate::ics::{PRODID, SOURCE_PROPERTY};
use crate::merge::MergedCalendar;

/// Render a merged calendar as an RFC 5545 document.
///
/// Every event gets UID, DTSTAMP, SUMMARY (possibly empty), and UTC
/// DTSTART/DTEND. LOCATION and DESCRIPTION appear only when present. An
/// empty calendar still has a complete envelope.
pub fn generate_ics(calendar: &MergedCalendar) -> String {
    let mut cal = Calendar::new();

    if let Some(name) = calendar.name() {
        cal.name(name);
    }

    let dtstamp = format_ics_utc(&calendar.generated_at());

    for record in calendar.events() {
        let mut ics_event = icalendar::Event::new();
        ics_event.uid(&record.uid);
        ics_event.add_property("DTSTAMP", &dtstamp);
        ics_event.summary(&text_value(&record.summary));
        ics_event.add_property("DTSTART", format_ics_utc(&record.start));
        ics_event.add_property("DTEND", format_ics_utc(&record.end));

        if let Some(ref loc) = record.location {
            ics_event.location(&text_value(loc));
        }

        if let Some(ref desc) = record.description {
            ics_event.description(&text_value(desc));
        }

        ics_event.add_property(SOURCE_PROPERTY, &record.source_id);

        cal.push(ics_event.done());
    }

    let cal = cal.done();

    normalize_envelope(&cal.to_string())
}

/// Fold CRLF and lone CR into LF. The icalendar crate escapes LF but
/// leaves CR raw, which is not allowed in a TEXT value.
fn text_value(value: &str) -> Cow<'_, str> {
    if value.contains('\r') {
        Cow::Owned(value.replace("\r\n", "\n").replace('\r', "\n"))
    } else {
        Cow::Borrowed(value)
    }
}

/// Clean up ICS output from the icalendar crate
/// - Replace PRODID with our fixed product identifier
/// - Remove CALSCALE:GREGORIAN (it's the default)
/// - Emit CRLF line endings throughout
fn normalize_envelope(ics: &str) -> String {
    let mut result = String::with_capacity(ics.len());

    for line in ics.lines() {
        if line.starts_with("PRODID:") {
            result.push_str("PRODID:");
            result.push_str(PRODID);
            result.push_str("\r\n");
            continue;
        }

        if line == "CALSCALE:GREGORIAN" {
            continue;
        }

        result.push_str(line);
        result.push_str("\r\n");
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventRecord;
    use crate::ics::parse_events;
    use chrono::{TimeZone, Utc};

    fn record(uid: &str, summary: &str, hour: u32) -> EventRecord {
        EventRecord {
            uid: uid.to_string(),
            summary: summary.to_string(),
            start: Utc.with_ymd_and_hms(2025, 3, 20, hour, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2025, 3, 20, hour + 1, 30, 0).unwrap(),
            location: None,
            description: None,
            source_id: "work-calendar".to_string(),
        }
    }

    fn calendar_with(events: Vec<EventRecord>) -> MergedCalendar {
        let mut calendar = MergedCalendar::new(None);
        calendar.extend(events);
        calendar
    }

    #[test]
    fn test_empty_calendar_is_header_and_footer_only() {
        let ics = generate_ics(&MergedCalendar::new(None));

        assert!(ics.starts_with("BEGIN:VCALENDAR\r\n"), "ICS:\n{ics}");
        assert!(ics.ends_with("END:VCALENDAR\r\n"), "ICS:\n{ics}");
        assert!(ics.contains("VERSION:2.0\r\n"));
        assert!(ics.contains(&format!("PRODID:{PRODID}\r\n")));
        assert!(!ics.contains("BEGIN:VEVENT"));
        assert!(parse_events(&ics, "x").unwrap().is_empty());
    }

    #[test]
    fn test_times_are_basic_utc_form() {
        let ics = generate_ics(&calendar_with(vec![record("a", "Standup", 9)]));

        assert!(ics.contains("DTSTART:20250320T090000Z\r\n"), "ICS:\n{ics}");
        assert!(ics.contains("DTEND:20250320T103000Z\r\n"), "ICS:\n{ics}");
    }

    #[test]
    fn test_one_block_per_event_with_required_fields() {
        let mut untitled = record("b", "", 13);
        untitled.location = Some("Room 4".to_string());
        let ics = generate_ics(&calendar_with(vec![record("a", "Standup", 9), untitled]));

        assert_eq!(ics.matches("BEGIN:VEVENT").count(), 2);
        assert_eq!(ics.matches("END:VEVENT").count(), 2);
        assert_eq!(ics.lines().filter(|l| l.starts_with("SUMMARY")).count(), 2);
        assert_eq!(ics.lines().filter(|l| l.starts_with("DTSTAMP")).count(), 2);
        assert_eq!(ics.lines().filter(|l| l.starts_with("LOCATION")).count(), 1);
        assert!(!ics.contains("DESCRIPTION"));
        assert!(ics.contains("SUMMARY:\r\n"), "Empty summary must still be written");
    }

    #[test]
    fn test_carriage_returns_in_text_become_line_breaks() {
        let mut event = record("a", "Line one\rLine two", 9);
        event.location = Some("Building 1\r\nRoom 4".to_string());
        event.description = Some("x\r\ny".to_string());

        let ics = generate_ics(&calendar_with(vec![event]));

        let stray_cr = ics
            .char_indices()
            .any(|(i, c)| c == '\r' && !ics[i + 1..].starts_with('\n'));
        assert!(!stray_cr, "Raw CR in:\n{ics:?}");
        assert!(ics.contains("DESCRIPTION:x\\ny\r\n"), "ICS:\n{ics:?}");
        assert!(ics.contains("SUMMARY:Line one\\nLine two\r\n"), "ICS:\n{ics:?}");
        assert_eq!(parse_events(&ics, "x").unwrap().len(), 1);
    }

    #[test]
    fn test_every_line_ends_with_crlf() {
        let ics = generate_ics(&calendar_with(vec![record("a", "Standup", 9)]));

        assert!(!ics.replace("\r\n", "").contains('\n'), "Bare LF in:\n{ics:?}");
        assert!(!ics.contains("CALSCALE"));
    }

    #[test]
    fn test_calendar_name_is_emitted() {
        let ics = generate_ics(&MergedCalendar::new(Some("Team week".to_string())));
        assert!(ics.contains("X-WR-CALNAME:Team week"), "ICS:\n{ics}");
    }

    #[test]
    fn test_generate_then_parse_roundtrip() {
        let mut with_details = record("b", "Planning", 13);
        with_details.location = Some("Room 4".to_string());
        with_details.description = Some("Quarterly planning session".to_string());
        with_details.source_id = "legacy-calendar".to_string();
        let mut described = record("c", "Review", 15);
        described.description = Some("Demo of the new build".to_string());

        let originals = vec![record("a", "Standup", 9), with_details, described];
        let ics = generate_ics(&calendar_with(originals.clone()));

        let mut reparsed: Vec<EventRecord> = parse_events(&ics, "ignored")
            .unwrap()
            .into_iter()
            .collect::<Result<_, _>>()
            .unwrap();
        reparsed.sort_by(|a, b| a.uid.cmp(&b.uid));

        assert_eq!(reparsed, originals);
    }
}
