//! Core engine for calmerge.
//!
//! This crate merges events from several calendar sources into one .ics
//! document:
//! - `source` holds calendar handles and source deduplication
//! - `provider` defines the capability interface to the host calendar system
//!   and the subprocess binding that implements it
//! - `extract` runs structured export with item-iteration fallback per source
//! - `merge` drives extraction over all sources into a `MergedCalendar`
//! - `ics` and `output` render the result and write it atomically

pub mod config;
pub mod date_window;
pub mod error;
pub mod event;
pub mod extract;
pub mod ics;
pub mod merge;
pub mod output;
pub mod provider;
pub mod source;

pub use date_window::DateWindow;
pub use error::{CalMergeError, CalMergeResult};
pub use event::EventRecord;
pub use extract::{ExtractionOutcome, extract};
pub use merge::{MergeEngine, MergeProgress, MergeRun, MergedCalendar, SourceReport, merge_all};
pub use output::{WriteMode, write_calendar};
pub use provider::{CalendarProvider, SubprocessProvider};
pub use source::{CalendarSourceHandle, dedupe};
