//! Calendar source provider capability interface.
//!
//! The core never talks to a host calendar application directly. Everything
//! it needs (discovery, structured export, item iteration) goes through
//! [`CalendarProvider`], so any concrete binding can be plugged in. The
//! bundled binding is [`SubprocessProvider`], which speaks a JSON protocol to
//! `calmerge-provider-<name>` executables.

#[cfg(test)]
pub(crate) mod fake;
pub mod protocol;
mod subprocess;

pub use subprocess::SubprocessProvider;

use serde::{Deserialize, Serialize};

use crate::date_window::DateWindow;
use crate::error::CalMergeResult;
use crate::source::CalendarSourceHandle;

/// How much of each event a structured export should carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalendarDetail {
    /// Only busy blocks, no titles
    FreeBusyOnly,
    /// Titles but no location or description
    LimitedDetails,
    FullDetails,
}

/// Options for a structured export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportOptions {
    pub detail: CalendarDetail,
    pub include_private_details: bool,
    pub include_attachments: bool,
    /// Export only this source, not other calendars the host links to it
    pub restrict_to_source: bool,
}

impl ExportOptions {
    /// The fixed options used for every primary extraction.
    pub const fn full() -> Self {
        ExportOptions {
            detail: CalendarDetail::FullDetails,
            include_private_details: true,
            include_attachments: false,
            restrict_to_source: true,
        }
    }
}

/// Parameters for item-by-item retrieval.
///
/// Providers should honour these where the host supports them; the core
/// re-applies sorting and window filtering on whatever comes back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemQuery {
    /// Restrict to items inside this window
    pub window: DateWindow,
    pub sort_by_start: bool,
    /// Ask the host to expand recurring series into individual occurrences
    pub include_recurrences: bool,
}

impl ItemQuery {
    pub fn new(window: DateWindow) -> Self {
        ItemQuery {
            window,
            sort_by_start: true,
            include_recurrences: true,
        }
    }
}

/// An event as reported by manual iteration, before validation.
///
/// Timestamps are strings (RFC 3339 or `YYYYMMDDTHHMMSSZ`) because hosts are
/// not trusted to produce well-formed values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Access to the calendar sources of one host.
///
/// All operations are fallible and treated as external. Calls are made one
/// at a time; implementations need not support concurrent use.
#[allow(async_fn_in_trait)]
pub trait CalendarProvider {
    /// Discover the calendars the host exposes.
    async fn list_sources(&self) -> CalMergeResult<Vec<CalendarSourceHandle>>;

    /// Ask the host for a ready-made calendar document covering `window`.
    async fn export_structured(
        &self,
        source: &CalendarSourceHandle,
        window: &DateWindow,
        options: &ExportOptions,
    ) -> CalMergeResult<Vec<u8>>;

    /// Enumerate the raw items of a source.
    async fn list_items(
        &self,
        source: &CalendarSourceHandle,
        query: &ItemQuery,
    ) -> CalMergeResult<Vec<RawItem>>;
}
