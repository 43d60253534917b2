//! Merge engine: runs extraction for each source and accumulates the result.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::date_window::DateWindow;
use crate::event::EventRecord;
use crate::extract::{ExtractionOutcome, extract};
use crate::provider::CalendarProvider;
use crate::source::CalendarSourceHandle;

/// The single calendar all sources are merged into.
///
/// Events keep source-processing order, then the order each source returned
/// them in. Only the merge engine appends; once a run hands it back it is
/// final.
#[derive(Debug, Clone)]
pub struct MergedCalendar {
    name: Option<String>,
    events: Vec<EventRecord>,
    generated_at: DateTime<Utc>,
}

impl MergedCalendar {
    pub fn new(name: Option<String>) -> Self {
        MergedCalendar {
            name,
            events: Vec::new(),
            generated_at: Utc::now(),
        }
    }

    /// A finished calendar holding exactly `events`.
    pub fn from_events(name: Option<String>, events: Vec<EventRecord>) -> Self {
        let mut calendar = Self::new(name);
        calendar.extend(events);
        calendar
    }

    pub(crate) fn extend(&mut self, events: impl IntoIterator<Item = EventRecord>) {
        self.events.extend(events);
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn events(&self) -> &[EventRecord] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Used as DTSTAMP for every event in the output.
    pub fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }
}

/// Outcome of one processed source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceReport {
    pub source: CalendarSourceHandle,
    pub outcome: ExtractionOutcome,
}

/// Progress notifications emitted while a run is underway.
#[derive(Debug)]
pub enum MergeProgress<'a> {
    Started {
        index: usize,
        total: usize,
        source: &'a CalendarSourceHandle,
    },
    Finished {
        index: usize,
        total: usize,
        report: &'a SourceReport,
    },
}

/// Everything a run produced.
#[derive(Debug)]
pub struct MergeRun {
    pub calendar: MergedCalendar,
    pub reports: Vec<SourceReport>,
    /// Sources never started because the run was cancelled
    pub skipped: Vec<CalendarSourceHandle>,
}

impl MergeRun {
    pub fn was_cancelled(&self) -> bool {
        !self.skipped.is_empty()
    }
}

/// Drives extraction over a list of sources, one at a time.
pub struct MergeEngine<'a, P> {
    provider: &'a P,
    calendar_name: Option<String>,
    cancel: Option<Arc<AtomicBool>>,
}

impl<'a, P: CalendarProvider> MergeEngine<'a, P> {
    pub fn new(provider: &'a P) -> Self {
        MergeEngine {
            provider,
            calendar_name: None,
            cancel: None,
        }
    }

    pub fn with_calendar_name(mut self, name: Option<String>) -> Self {
        self.calendar_name = name;
        self
    }

    /// Checked before each source; once set, no further source is started.
    pub fn with_cancellation(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub async fn run(&self, sources: &[CalendarSourceHandle], window: &DateWindow) -> MergeRun {
        self.run_with_progress(sources, window, |_| {}).await
    }

    /// Process `sources` in order. A failed source never stops the run.
    pub async fn run_with_progress<F>(
        &self,
        sources: &[CalendarSourceHandle],
        window: &DateWindow,
        mut on_progress: F,
    ) -> MergeRun
    where
        F: FnMut(MergeProgress<'_>),
    {
        let mut calendar = MergedCalendar::new(self.calendar_name.clone());
        let mut reports = Vec::with_capacity(sources.len());
        let total = sources.len();

        for (index, source) in sources.iter().enumerate() {
            if self.is_cancelled() {
                info!(remaining = total - index, "merge cancelled");
                return MergeRun {
                    calendar,
                    reports,
                    skipped: sources[index..].to_vec(),
                };
            }

            on_progress(MergeProgress::Started {
                index,
                total,
                source,
            });

            let (events, outcome) = extract(self.provider, source, window).await;
            calendar.extend(events);

            reports.push(SourceReport {
                source: source.clone(),
                outcome,
            });
            if let Some(report) = reports.last() {
                on_progress(MergeProgress::Finished {
                    index,
                    total,
                    report,
                });
            }
        }

        info!(
            sources = total,
            events = calendar.len(),
            failed = reports.iter().filter(|r| r.outcome.is_failed()).count(),
            "merge finished"
        );

        MergeRun {
            calendar,
            reports,
            skipped: Vec::new(),
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }
}

/// Merge every source in order, returning the calendar and a per-source report.
pub async fn merge_all<P: CalendarProvider>(
    provider: &P,
    sources: &[CalendarSourceHandle],
    window: &DateWindow,
) -> (MergedCalendar, Vec<SourceReport>) {
    let run = MergeEngine::new(provider).run(sources, window).await;
    (run.calendar, run.reports)
}
