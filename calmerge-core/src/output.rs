//! Atomic output writer for the merged calendar.

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{CalMergeError, CalMergeResult};
use crate::ics::generate_ics;
use crate::merge::MergedCalendar;

/// What to do when the destination already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Fail with [`CalMergeError::OutputExists`] rather than replace anything
    CreateNew,
    /// Replace the existing file in one step
    Overwrite,
}

/// Render `calendar` and write it to `path` atomically.
///
/// Returns the resolved path of the written file. On any error the
/// destination is left exactly as it was.
pub fn write_calendar(
    calendar: &MergedCalendar,
    path: &Path,
    mode: WriteMode,
) -> CalMergeResult<PathBuf> {
    let content = generate_ics(calendar);
    let written = write_atomic(path, content.as_bytes(), mode)?;
    info!(path = %written.display(), events = calendar.len(), "calendar written");
    Ok(written)
}

/// Write `bytes` to a temporary file next to `path`, sync it, then rename it
/// into place.
pub fn write_atomic(path: &Path, bytes: &[u8], mode: WriteMode) -> CalMergeResult<PathBuf> {
    if mode == WriteMode::CreateNew && path.exists() {
        return Err(CalMergeError::OutputExists(path.to_path_buf()));
    }

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    // Same directory as the target so the final rename never crosses filesystems
    let mut temp = tempfile::Builder::new()
        .prefix(".calmerge-")
        .suffix(".tmp")
        .tempfile_in(dir)?;
    temp.write_all(bytes)?;
    temp.as_file().sync_all()?;

    match mode {
        WriteMode::CreateNew => temp.persist_noclobber(path).map_err(|e| {
            if e.error.kind() == ErrorKind::AlreadyExists {
                CalMergeError::OutputExists(path.to_path_buf())
            } else {
                CalMergeError::Io(e.error)
            }
        })?,
        WriteMode::Overwrite => temp.persist(path).map_err(|e| CalMergeError::Io(e.error))?,
    };

    Ok(std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf()))
}
