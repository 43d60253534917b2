//! ICS generation and parsing.
//!
//! Reads provider exports and writes the merged document according to
//! RFC 5545.

mod generate;
mod parse;

pub use generate::generate_ics;
pub use parse::{parse_events, to_utc};

/// Product identifier written into every merged calendar.
pub const PRODID: &str = "-//calmerge//Calendar Merge//EN";

/// Carries the identity of the source an event came from.
pub const SOURCE_PROPERTY: &str = "X-CALMERGE-SOURCE";
