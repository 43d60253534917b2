use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Result, bail};
use calmerge_core::config::CalmergeConfig;
use calmerge_core::{
    CalendarProvider, DateWindow, MergeEngine, MergeProgress, WriteMode, write_calendar,
};
use indicatif::ProgressBar;
use owo_colors::OwoColorize;
use tracing::info;

use crate::dates::default_output_filename;
use crate::render::Render;
use crate::selection;
use crate::utils::tui::{self, pluralize};

pub struct ExportArgs {
    pub window: DateWindow,
    pub selectors: Vec<String>,
    pub all: bool,
    pub output: Option<PathBuf>,
    pub force: bool,
}

pub async fn run<P: CalendarProvider>(
    provider: &P,
    config: &CalmergeConfig,
    args: ExportArgs,
) -> Result<()> {
    let output = match args.output {
        Some(path) => path,
        None => config.output_dir().join(default_output_filename(&args.window)),
    };

    // Fail before doing any extraction work
    if output.exists() && !args.force {
        bail!(
            "{} already exists. Use --force to replace it.",
            output.display()
        );
    }

    let sources = super::discover(provider).await?;
    if sources.is_empty() {
        bail!("No calendars found to export");
    }

    let selected = if args.all {
        sources
    } else if !args.selectors.is_empty() {
        selection::resolve(&sources, &args.selectors)?
    } else {
        selection::prompt(&sources)?
    };

    if selected.is_empty() {
        println!("{}", "No calendars selected".dimmed());
        return Ok(());
    }

    println!(
        "Exporting {} {} for {}\n",
        selected.len(),
        pluralize("calendar", selected.len()),
        args.window
    );

    info!(output = %output.display(), window = %args.window, "starting export");

    let cancel = Arc::new(AtomicBool::new(false));
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.store(true, Ordering::SeqCst);
            }
        });
    }

    let engine = MergeEngine::new(provider)
        .with_calendar_name(config.calendar_name.clone())
        .with_cancellation(cancel);

    let mut spinner: Option<ProgressBar> = None;
    let run = engine
        .run_with_progress(&selected, &args.window, |progress| match progress {
            MergeProgress::Started { source, .. } => {
                spinner = Some(tui::create_spinner(source.render()));
            }
            MergeProgress::Finished { report, .. } => {
                if let Some(spinner) = spinner.take() {
                    spinner.finish_and_clear();
                }
                println!("{}", report.render());
            }
        })
        .await;

    if run.was_cancelled() {
        println!(
            "\n{} Interrupted, skipped {} {}:",
            "!".yellow(),
            run.skipped.len(),
            pluralize("calendar", run.skipped.len())
        );
        for source in &run.skipped {
            println!("   {}", source.render().dimmed());
        }
    }

    let failed = run.reports.iter().filter(|r| r.outcome.is_failed()).count();

    let mode = if args.force {
        WriteMode::Overwrite
    } else {
        WriteMode::CreateNew
    };
    let path = write_calendar(&run.calendar, &output, mode)?;

    println!(
        "\n{} Wrote {} {} to {}",
        "✓".green(),
        run.calendar.len(),
        pluralize("event", run.calendar.len()),
        path.display()
    );
    if failed > 0 {
        println!(
            "{}",
            format!(
                "{} {} could not be exported",
                failed,
                pluralize("calendar", failed)
            )
            .red()
        );
    }

    Ok(())
}
