//! Reading .ics files from disk.

use std::path::Path;

use anyhow::{Context, Result};
use icalendar::parser::{read_calendar, unfold};

/// Whether `path` looks like a calendar file (`.ics`, any case).
pub fn is_ics(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("ics"))
}

pub fn read(path: &Path) -> Result<String> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let content = String::from_utf8(bytes)
        .with_context(|| format!("{} is not valid UTF-8", path.display()))?;
    Ok(content.trim_start_matches('\u{feff}').to_string())
}

/// The calendar's own name (`X-WR-CALNAME`), if it declares one.
pub fn calendar_name(content: &str) -> Option<String> {
    let unfolded = unfold(content);
    let calendar = read_calendar(&unfolded).ok()?;

    calendar
        .properties
        .iter()
        .find(|p| p.name == "X-WR-CALNAME")
        .map(|p| p.val.to_string())
        .filter(|name| !name.trim().is_empty())
}
