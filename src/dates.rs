//! Turning `--from` / `--to` arguments into a [`DateWindow`].

use anyhow::{Context, Result, bail};
use calmerge_core::DateWindow;
use chrono::{DateTime, Datelike, Days, Duration, NaiveDate, NaiveTime, Utc};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Build the export window from optional CLI dates.
///
/// Both bounds are inclusive days: the window runs from 00:00:00 on the first
/// day to 23:59:59 on the last. Without `--from` the window is the coming
/// Monday through Sunday; without `--to` it spans seven days from `--from`.
pub fn window_from_args(
    from: Option<&str>,
    to: Option<&str>,
    today: NaiveDate,
) -> Result<DateWindow> {
    let first = match from {
        Some(s) => parse_date(s)?,
        None => next_monday(today),
    };
    let last = match to {
        Some(s) => parse_date(s)?,
        None => first + Days::new(6),
    };

    if last < first {
        if from.is_some() {
            bail!(
                "--to ({}) is before --from ({})",
                last.format(DATE_FORMAT),
                first.format(DATE_FORMAT)
            );
        }
        bail!(
            "--to ({}) is before the default start, next Monday ({}). Pass --from as well.",
            last.format(DATE_FORMAT),
            first.format(DATE_FORMAT)
        );
    }

    Ok(DateWindow::new(start_of_day(first), end_of_day(last)?)?)
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// 23:59:59 on `date`: one second before the next day starts.
fn end_of_day(date: NaiveDate) -> Result<DateTime<Utc>> {
    let next = date
        .checked_add_days(Days::new(1))
        .with_context(|| format!("Date {} is out of range", date.format(DATE_FORMAT)))?;
    Ok(start_of_day(next) - Duration::seconds(1))
}

/// `Merged_Export_<first>_to_<last>.ics`, named after the window's days.
pub fn default_output_filename(window: &DateWindow) -> String {
    format!(
        "Merged_Export_{}_to_{}.ics",
        window.start.format(DATE_FORMAT),
        window.end.format(DATE_FORMAT)
    )
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
        .with_context(|| format!("Invalid date '{s}', expected YYYY-MM-DD"))
}

/// The Monday after `today`. On a Monday this is a week ahead.
fn next_monday(today: NaiveDate) -> NaiveDate {
    let days_ahead = 7 - u64::from(today.weekday().num_days_from_monday());
    today + Days::new(days_ahead)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_default_window_is_next_monday_to_sunday() {
        // Wednesday
        let window = window_from_args(None, None, date(2025, 3, 12)).unwrap();

        assert_eq!(window.start, Utc.with_ymd_and_hms(2025, 3, 17, 0, 0, 0).unwrap());
        assert_eq!(window.end, Utc.with_ymd_and_hms(2025, 3, 23, 23, 59, 59).unwrap());
    }

    #[test]
    fn test_next_monday_from_monday_and_sunday() {
        assert_eq!(next_monday(date(2025, 3, 17)), date(2025, 3, 24));
        assert_eq!(next_monday(date(2025, 3, 16)), date(2025, 3, 17));
    }

    #[test]
    fn test_from_alone_spans_a_week() {
        let window = window_from_args(Some("2025-03-20"), None, date(2025, 1, 1)).unwrap();

        assert_eq!(window.start, Utc.with_ymd_and_hms(2025, 3, 20, 0, 0, 0).unwrap());
        assert_eq!(window.end, Utc.with_ymd_and_hms(2025, 3, 26, 23, 59, 59).unwrap());
    }

    #[test]
    fn test_single_day_window() {
        let window =
            window_from_args(Some("2025-03-20"), Some("2025-03-20"), date(2025, 1, 1)).unwrap();

        assert_eq!(window.start, Utc.with_ymd_and_hms(2025, 3, 20, 0, 0, 0).unwrap());
        assert_eq!(window.end, Utc.with_ymd_and_hms(2025, 3, 20, 23, 59, 59).unwrap());
    }

    #[test]
    fn test_inverted_dates_are_rejected() {
        let err = window_from_args(Some("2025-03-20"), Some("2025-03-19"), date(2025, 1, 1))
            .unwrap_err();
        assert!(err.to_string().contains("before --from"));
    }

    #[test]
    fn test_to_before_default_start_names_next_monday() {
        // Wednesday, so the default start is 2025-03-17
        let err = window_from_args(None, Some("2025-03-14"), date(2025, 3, 12)).unwrap_err();

        let message = err.to_string();
        assert!(message.contains("next Monday (2025-03-17)"), "Got: {message}");
        assert!(!message.contains("before --from"));
    }

    #[test]
    fn test_end_of_day_is_last_second() {
        assert_eq!(
            end_of_day(date(2024, 12, 31)).unwrap(),
            Utc.with_ymd_and_hms(2024, 12, 31, 23, 59, 59).unwrap()
        );
        assert!(end_of_day(NaiveDate::MAX).is_err());
    }

    #[test]
    fn test_bad_date_is_rejected() {
        assert!(window_from_args(Some("20/03/2025"), None, date(2025, 1, 1)).is_err());
    }

    #[test]
    fn test_default_output_filename() {
        let window =
            window_from_args(Some("2025-03-17"), Some("2025-03-23"), date(2025, 1, 1)).unwrap();
        assert_eq!(
            default_output_filename(&window),
            "Merged_Export_2025-03-17_to_2025-03-23.ics"
        );
    }
}
