//! Calendar source handles and source deduplication.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// One addressable calendar, as discovered from a provider.
///
/// `identity` is opaque and stable: two handles with the same identity refer
/// to the same underlying calendar, whatever their display names say.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CalendarSourceHandle {
    pub identity: String,
    pub display_name: String,
}

impl CalendarSourceHandle {
    pub fn new(identity: impl Into<String>, display_name: impl Into<String>) -> Self {
        CalendarSourceHandle {
            identity: identity.into(),
            display_name: display_name.into(),
        }
    }
}

impl fmt::Display for CalendarSourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name)
    }
}

/// Collapse handles that share an identity, keeping the first one seen.
///
/// Relative order of first occurrences is preserved.
pub fn dedupe<I>(sources: I) -> Vec<CalendarSourceHandle>
where
    I: IntoIterator<Item = CalendarSourceHandle>,
{
    let mut seen = HashSet::new();
    sources
        .into_iter()
        .filter(|source| seen.insert(source.identity.clone()))
        .collect()
}
