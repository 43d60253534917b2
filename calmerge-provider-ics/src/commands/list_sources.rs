//! Discover .ics files in the configured directories.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use calmerge_core::CalendarSourceHandle;
use calmerge_core::provider::protocol::ListSources;
use tracing::{debug, warn};

use crate::calendar_file;
use crate::config::{DIRS_ENV, IcsProviderConfig};

/// Files are listed per directory in name order. A file reachable from two
/// configured directories is reported twice with the same identity.
pub async fn handle(
    config: &IcsProviderConfig,
    _cmd: ListSources,
) -> Result<Vec<CalendarSourceHandle>> {
    if config.directories.is_empty() {
        bail!(
            "No calendar directories configured.\n\n\
            Add them to {}:\n\n  \
              directories = [\"~/Calendars\"]\n\n\
            or set {}.",
            IcsProviderConfig::path_hint(),
            DIRS_ENV
        );
    }

    let mut sources = Vec::new();

    for dir in &config.directories {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(dir = %dir.display(), "skipping unreadable directory: {}", e);
                continue;
            }
        };

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| calendar_file::is_ics(path))
            .collect();
        paths.sort();

        for path in paths {
            match source_for(&path) {
                Ok(source) => sources.push(source),
                Err(e) => warn!(path = %path.display(), "skipping calendar file: {:#}", e),
            }
        }
    }

    debug!(count = sources.len(), "discovered calendar files");
    Ok(sources)
}

fn source_for(path: &Path) -> Result<CalendarSourceHandle> {
    let canonical = path
        .canonicalize()
        .with_context(|| format!("Failed to resolve {}", path.display()))?;
    let content = calendar_file::read(&canonical)?;

    let display_name = calendar_file::calendar_name(&content)
        .or_else(|| {
            canonical
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| canonical.display().to_string());

    Ok(CalendarSourceHandle::new(
        canonical.display().to_string(),
        display_name,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::write_calendar;

    fn config_for(dirs: &[&Path]) -> IcsProviderConfig {
        IcsProviderConfig {
            directories: dirs.iter().map(|d| d.to_path_buf()).collect(),
        }
    }

    #[tokio::test]
    async fn test_lists_ics_files_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        let work = write_calendar(dir.path(), "work.ics", "");
        let home = write_calendar(dir.path(), "home.ics", "");
        std::fs::write(dir.path().join("notes.txt"), "not a calendar").unwrap();

        let sources = handle(&config_for(&[dir.path()]), ListSources {}).await.unwrap();

        assert_eq!(
            sources,
            vec![
                CalendarSourceHandle::new(home.display().to_string(), "home"),
                CalendarSourceHandle::new(work.display().to_string(), "work"),
            ]
        );
    }

    #[tokio::test]
    async fn test_calendar_name_header_wins_over_file_name() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("export-3.ics"),
            "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:TEST\r\nX-WR-CALNAME:Legacy\r\nEND:VCALENDAR\r\n",
        )
        .unwrap();

        let sources = handle(&config_for(&[dir.path()]), ListSources {}).await.unwrap();

        assert_eq!(sources[0].display_name, "Legacy");
    }

    #[tokio::test]
    async fn test_same_file_through_two_directories_keeps_one_identity() {
        let dir = tempfile::tempdir().unwrap();
        write_calendar(dir.path(), "shared.ics", "");
        let same_dir_again = dir.path().join(".");

        let sources = handle(&config_for(&[dir.path(), &same_dir_again]), ListSources {})
            .await
            .unwrap();

        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].identity, sources[1].identity);
        assert_eq!(calmerge_core::dedupe(sources).len(), 1);
    }

    #[tokio::test]
    async fn test_missing_directory_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write_calendar(dir.path(), "work.ics", "");
        let missing = dir.path().join("does-not-exist");

        let sources = handle(&config_for(&[&missing, dir.path()]), ListSources {})
            .await
            .unwrap();

        assert_eq!(sources.len(), 1);
    }

    #[tokio::test]
    async fn test_no_directories_is_an_error() {
        let err = handle(&IcsProviderConfig::default(), ListSources {})
            .await
            .unwrap_err();
        assert!(err.to_string().contains("No calendar directories configured"));
    }
}
