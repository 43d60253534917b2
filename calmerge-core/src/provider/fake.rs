//! Scriptable in-memory provider for tests.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::date_window::DateWindow;
use crate::error::{CalMergeError, CalMergeResult};
use crate::provider::{CalendarProvider, ExportOptions, ItemQuery, RawItem};
use crate::source::CalendarSourceHandle;

#[derive(Default)]
pub(crate) struct FakeProvider {
    sources: Vec<CalendarSourceHandle>,
    exports: HashMap<String, Result<String, String>>,
    items: HashMap<String, Result<Vec<RawItem>, String>>,
    calls: RefCell<Vec<(&'static str, String)>>,
}

impl FakeProvider {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_source(mut self, source: CalendarSourceHandle) -> Self {
        self.sources.push(source);
        self
    }

    pub(crate) fn export_ok(mut self, identity: &str, ics: String) -> Self {
        self.exports.insert(identity.to_string(), Ok(ics));
        self
    }

    pub(crate) fn export_err(mut self, identity: &str, error: &str) -> Self {
        self.exports.insert(identity.to_string(), Err(error.to_string()));
        self
    }

    pub(crate) fn items_ok(mut self, identity: &str, items: Vec<RawItem>) -> Self {
        self.items.insert(identity.to_string(), Ok(items));
        self
    }

    pub(crate) fn items_err(mut self, identity: &str, error: &str) -> Self {
        self.items.insert(identity.to_string(), Err(error.to_string()));
        self
    }

    /// How many times `operation` was called for `identity`.
    pub(crate) fn calls(&self, operation: &str, identity: &str) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|(op, id)| *op == operation && id == identity)
            .count()
    }

    fn record(&self, operation: &'static str, identity: &str) {
        self.calls.borrow_mut().push((operation, identity.to_string()));
    }
}

impl CalendarProvider for FakeProvider {
    async fn list_sources(&self) -> CalMergeResult<Vec<CalendarSourceHandle>> {
        Ok(self.sources.clone())
    }

    async fn export_structured(
        &self,
        source: &CalendarSourceHandle,
        _window: &DateWindow,
        _options: &ExportOptions,
    ) -> CalMergeResult<Vec<u8>> {
        self.record("export", &source.identity);
        match self.exports.get(&source.identity) {
            Some(Ok(ics)) => Ok(ics.clone().into_bytes()),
            Some(Err(e)) => Err(CalMergeError::Provider(e.clone())),
            None => Err(CalMergeError::Provider("Structured export not supported".into())),
        }
    }

    async fn list_items(
        &self,
        source: &CalendarSourceHandle,
        _query: &ItemQuery,
    ) -> CalMergeResult<Vec<RawItem>> {
        self.record("items", &source.identity);
        match self.items.get(&source.identity) {
            Some(Ok(items)) => Ok(items.clone()),
            Some(Err(e)) => Err(CalMergeError::Provider(e.clone())),
            None => Err(CalMergeError::Provider("Item iteration not supported".into())),
        }
    }
}

/// Build a calendar document from `(uid, summary, start, end)` tuples.
pub(crate) fn ics_document(events: &[(&str, &str, &str, &str)]) -> String {
    let mut ics = String::from("BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:TEST\r\n");
    for (uid, summary, start, end) in events {
        ics.push_str(&format!(
            "BEGIN:VEVENT\r\nUID:{uid}\r\nSUMMARY:{summary}\r\nDTSTART:{start}\r\nDTEND:{end}\r\nEND:VEVENT\r\n"
        ));
    }
    ics.push_str("END:VCALENDAR\r\n");
    ics
}

/// A raw item with UTC start/end in basic ICS form.
pub(crate) fn raw_item(uid: &str, summary: &str, start: &str, end: &str) -> RawItem {
    RawItem {
        uid: Some(uid.to_string()),
        summary: Some(summary.to_string()),
        start: Some(start.to_string()),
        end: Some(end.to_string()),
        location: None,
        description: None,
    }
}
