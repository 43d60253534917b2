use anyhow::Result;
use calmerge_core::CalendarProvider;
use owo_colors::OwoColorize;

use crate::render::render_numbered;

pub async fn run<P: CalendarProvider>(provider: &P) -> Result<()> {
    let sources = super::discover(provider).await?;

    if sources.is_empty() {
        println!("{}", "No calendars found".dimmed());
        return Ok(());
    }

    for (i, source) in sources.iter().enumerate() {
        println!("{}", render_numbered(i + 1, source));
    }

    Ok(())
}
