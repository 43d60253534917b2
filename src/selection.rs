//! Choosing which discovered calendars go into the export.

use anyhow::{Result, bail};
use calmerge_core::{CalendarSourceHandle, dedupe};
use dialoguer::MultiSelect;

/// Resolve `--calendar` selectors against the discovered sources.
///
/// A selector matches a 1-based position in the `calmerge sources` listing,
/// an exact identity, or a display name (case-insensitive). Selecting the
/// same calendar twice includes it once.
pub fn resolve(
    sources: &[CalendarSourceHandle],
    selectors: &[String],
) -> Result<Vec<CalendarSourceHandle>> {
    let mut selected = Vec::with_capacity(selectors.len());

    for selector in selectors {
        selected.push(resolve_one(sources, selector)?.clone());
    }

    Ok(dedupe(selected))
}

fn resolve_one<'a>(
    sources: &'a [CalendarSourceHandle],
    selector: &str,
) -> Result<&'a CalendarSourceHandle> {
    let selector = selector.trim();

    if let Some(source) = selector
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| sources.get(i))
    {
        return Ok(source);
    }

    if let Some(source) = sources.iter().find(|s| s.identity == selector) {
        return Ok(source);
    }

    let by_name: Vec<&CalendarSourceHandle> = sources
        .iter()
        .filter(|s| s.display_name.eq_ignore_ascii_case(selector))
        .collect();

    match by_name.as_slice() {
        [source] => Ok(source),
        [] => bail!(
            "No calendar matches '{}'. Available calendars:\n{}",
            selector,
            listing(sources)
        ),
        _ => bail!(
            "'{}' matches more than one calendar. Use its number or identity instead:\n{}",
            selector,
            listing(sources)
        ),
    }
}

fn listing(sources: &[CalendarSourceHandle]) -> String {
    sources
        .iter()
        .enumerate()
        .map(|(i, s)| format!("  {}. {} ({})", i + 1, s.display_name, s.identity))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Ask which calendars to export. Everything starts selected.
pub fn prompt(sources: &[CalendarSourceHandle]) -> Result<Vec<CalendarSourceHandle>> {
    let items: Vec<&str> = sources.iter().map(|s| s.display_name.as_str()).collect();
    let defaults = vec![true; sources.len()];

    let chosen = MultiSelect::new()
        .with_prompt("Select calendars to export (space to toggle, enter to confirm)")
        .items(&items)
        .defaults(&defaults)
        .interact()?;

    Ok(chosen.into_iter().map(|i| sources[i].clone()).collect())
}
