//! Date window for bounding an export.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CalMergeError, CalMergeResult};

/// Inclusive `[start, end]` window in UTC.
///
/// Both bounds are inclusive. Turning a date-only `end` into the last second
/// of that day is the caller's job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateWindow {
    /// Build a window, rejecting `start > end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> CalMergeResult<Self> {
        if start > end {
            return Err(CalMergeError::InvalidWindow { start, end });
        }
        Ok(DateWindow { start, end })
    }

    pub fn is_valid(&self) -> bool {
        self.start <= self.end
    }

    /// True when an item spanning `[start, end]` lies entirely inside the window.
    ///
    /// An inverted window contains nothing.
    pub fn contains(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.is_valid() && start >= self.start && end <= self.end
    }

    /// True when `[start, end]` touches the window at all.
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.is_valid() && start <= self.end && end >= self.start
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} to {}",
            self.start.format("%Y-%m-%d"),
            self.end.format("%Y-%m-%d")
        )
    }
}
