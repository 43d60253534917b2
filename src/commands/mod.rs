pub mod export;
pub mod sources;

use anyhow::Result;
use calmerge_core::{CalendarProvider, CalendarSourceHandle, dedupe};

use crate::utils::tui;

/// Ask the provider for its calendars, with duplicates removed.
async fn discover<P: CalendarProvider>(provider: &P) -> Result<Vec<CalendarSourceHandle>> {
    let spinner = tui::create_spinner("Discovering calendars...".to_string());
    let result = provider.list_sources().await;
    spinner.finish_and_clear();

    Ok(dedupe(result?))
}
