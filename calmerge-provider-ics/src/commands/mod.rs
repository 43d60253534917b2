pub mod export_structured;
pub mod list_items;
pub mod list_sources;

use std::path::PathBuf;

use calmerge_core::CalendarSourceHandle;

/// Sources are files; the identity is the file's canonical path.
fn source_path(source: &CalendarSourceHandle) -> PathBuf {
    PathBuf::from(&source.identity)
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::{Path, PathBuf};

    /// Write a calendar file holding `vevents` and return its canonical path.
    pub fn write_calendar(dir: &Path, file_name: &str, vevents: &str) -> PathBuf {
        let path = dir.join(file_name);
        let content = format!(
            "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:TEST\r\n{vevents}END:VCALENDAR\r\n"
        );
        std::fs::write(&path, content).unwrap();
        path.canonicalize().unwrap()
    }

    pub fn vevent(uid: &str, summary: &str, start: &str, end: &str) -> String {
        format!(
            "BEGIN:VEVENT\r\nUID:{uid}\r\nSUMMARY:{summary}\r\nDTSTART:{start}\r\nDTEND:{end}\r\n\
             LOCATION:Room 1\r\nDESCRIPTION:Agenda\r\nEND:VEVENT\r\n"
        )
    }
}
