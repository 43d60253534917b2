//! Provider subprocess binding.
//!
//! Talks to external provider binaries (e.g. `calmerge-provider-ics`) using
//! JSON over stdin/stdout. Any executable that speaks the protocol in
//! [`crate::provider::protocol`] can be a provider.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::io::AsyncWriteExt;
use tokio::process::Command as TokioCommand;
use tokio::time::timeout;
use tracing::debug;

use crate::date_window::DateWindow;
use crate::error::{CalMergeError, CalMergeResult};
use crate::provider::protocol::{
    Command, ExportStructured, ListItems, ListSources, ProviderCommand, Request, Response,
};
use crate::provider::{CalendarProvider, ExportOptions, ItemQuery, RawItem};
use crate::source::CalendarSourceHandle;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
const EXPORT_FILE_NAME: &str = "export.ics";
const STAGING_PREFIX: &str = "calmerge-export-";

/// A provider implemented by a `calmerge-provider-<name>` executable on PATH.
#[derive(Clone, Debug)]
pub struct SubprocessProvider {
    name: String,
    timeout: Duration,
    binary_path: Option<PathBuf>,
    staging_root: Option<PathBuf>,
}

impl SubprocessProvider {
    pub fn from_name(name: &str) -> Self {
        SubprocessProvider {
            name: name.to_string(),
            timeout: DEFAULT_TIMEOUT,
            binary_path: None,
            staging_root: None,
        }
    }

    /// Run this executable instead of looking the provider up on PATH.
    pub fn with_binary_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.binary_path = Some(path.into());
        self
    }

    /// Create export staging directories under `dir` instead of the system
    /// temp directory.
    pub fn with_staging_root(mut self, dir: impl Into<PathBuf>) -> Self {
        self.staging_root = Some(dir.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn binary_name(&self) -> String {
        format!("calmerge-provider-{}", self.name)
    }

    fn binary_path(&self) -> CalMergeResult<PathBuf> {
        if let Some(path) = &self.binary_path {
            return Ok(path.clone());
        }
        let binary_name = self.binary_name();
        which::which(&binary_name).map_err(|_| CalMergeError::ProviderNotInstalled(binary_name))
    }

    /// Call a typed provider command and return the result.
    ///
    /// The response type is inferred from the command's associated type.
    pub async fn call<C: ProviderCommand>(&self, cmd: C) -> CalMergeResult<C::Response> {
        timeout(self.timeout, self.call_raw(C::command(), cmd))
            .await
            .map_err(|_| CalMergeError::ProviderTimeout(self.timeout.as_secs()))?
    }

    /// Low-level call that sends a command with params and deserializes the response.
    async fn call_raw<P: Serialize, R: DeserializeOwned>(
        &self,
        command: Command,
        params: P,
    ) -> CalMergeResult<R> {
        let params = serde_json::to_value(params)
            .map_err(|e| CalMergeError::Serialization(e.to_string()))?;
        let request = Request { command, params };
        let request_json = serde_json::to_string(&request)
            .map_err(|e| CalMergeError::Serialization(e.to_string()))?;

        let binary_path = self.binary_path()?;
        debug!(provider = %self.name, ?command, "calling provider");

        let mut child = TokioCommand::new(&binary_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                CalMergeError::Provider(format!("Failed to spawn {}: {}", binary_path.display(), e))
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| CalMergeError::Provider("Provider stdin unavailable".into()))?;
        stdin
            .write_all(format!("{request_json}\n").as_bytes())
            .await?;
        drop(stdin);

        let output = child.wait_with_output().await?;

        if !output.status.success() {
            return Err(CalMergeError::Provider(format!(
                "Provider exited with status: {}",
                output.status.code().unwrap_or(-1)
            )));
        }

        let response_str = String::from_utf8_lossy(&output.stdout);
        let response_line = response_str.lines().find(|l| !l.trim().is_empty());
        let Some(response_line) = response_line else {
            return Err(CalMergeError::Provider("Provider returned no response".into()));
        };

        let response: Response<R> = serde_json::from_str(response_line)
            .map_err(|e| CalMergeError::Provider(format!("Failed to parse response: {}", e)))?;

        match response {
            Response::Success { data } => Ok(data),
            Response::Error { error } => Err(CalMergeError::Provider(error)),
        }
    }
}

impl CalendarProvider for SubprocessProvider {
    async fn list_sources(&self) -> CalMergeResult<Vec<CalendarSourceHandle>> {
        self.call(ListSources {}).await
    }

    async fn export_structured(
        &self,
        source: &CalendarSourceHandle,
        window: &DateWindow,
        options: &ExportOptions,
    ) -> CalMergeResult<Vec<u8>> {
        // Removed when dropped, on success and failure alike.
        let mut builder = tempfile::Builder::new();
        builder.prefix(STAGING_PREFIX);
        let staging = match &self.staging_root {
            Some(root) => builder.tempdir_in(root)?,
            None => builder.tempdir()?,
        };
        let output_path = staging.path().join(EXPORT_FILE_NAME);

        self.call(ExportStructured {
            source: source.clone(),
            window: *window,
            options: *options,
            output_path: output_path.clone(),
        })
        .await?;

        let bytes = tokio::fs::read(&output_path).await.map_err(|e| {
            CalMergeError::Provider(format!("Provider did not produce an export file: {e}"))
        })?;
        Ok(bytes)
    }

    async fn list_items(
        &self,
        source: &CalendarSourceHandle,
        query: &ItemQuery,
    ) -> CalMergeResult<Vec<RawItem>> {
        self.call(ListItems {
            source: source.clone(),
            query: *query,
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::path::Path;

    fn source() -> CalendarSourceHandle {
        CalendarSourceHandle::new("a", "A")
    }

    fn week() -> DateWindow {
        DateWindow::new(
            Utc.with_ymd_and_hms(2025, 3, 17, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 3, 23, 23, 59, 59).unwrap(),
        )
        .unwrap()
    }

    /// A shell provider that reads the request, writes the staging file
    /// named in it, then runs `reply`.
    #[cfg(unix)]
    fn script_provider(dir: &Path, reply: &str) -> SubprocessProvider {
        use std::os::unix::fs::PermissionsExt;

        let script = dir.join("calmerge-provider-script");
        let body = format!(
            "#!/bin/sh\n\
             read -r line\n\
             out=$(printf '%s' \"$line\" | sed 's/.*\"output_path\":\"\\([^\"]*\\)\".*/\\1/')\n\
             printf 'BEGIN:VCALENDAR\\r\\nVERSION:2.0\\r\\nPRODID:TEST\\r\\nEND:VCALENDAR\\r\\n' > \"$out\"\n\
             {reply}\n"
        );
        std::fs::write(&script, body).unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        SubprocessProvider::from_name("script").with_binary_path(script)
    }

    #[cfg(unix)]
    fn staging_dirs_left(root: &Path) -> usize {
        std::fs::read_dir(root)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with(STAGING_PREFIX))
            .count()
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_staging_removed_after_successful_export() {
        let bin = tempfile::tempdir().unwrap();
        let staging = tempfile::tempdir().unwrap();
        let reply = r#"echo '{"status":"success","data":null}'"#;
        let provider = script_provider(bin.path(), reply).with_staging_root(staging.path());

        let bytes = provider
            .export_structured(&source(), &week(), &ExportOptions::full())
            .await
            .unwrap();

        assert!(String::from_utf8(bytes).unwrap().starts_with("BEGIN:VCALENDAR"));
        assert_eq!(staging_dirs_left(staging.path()), 0);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_staging_removed_when_provider_reports_error() {
        let bin = tempfile::tempdir().unwrap();
        let staging = tempfile::tempdir().unwrap();
        let reply = r#"echo '{"status":"error","error":"boom"}'"#;
        let provider = script_provider(bin.path(), reply).with_staging_root(staging.path());

        let err = provider
            .export_structured(&source(), &week(), &ExportOptions::full())
            .await
            .unwrap_err();

        assert!(
            matches!(err, CalMergeError::Provider(ref msg) if msg == "boom"),
            "Got: {err:?}"
        );
        assert_eq!(staging_dirs_left(staging.path()), 0);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_staging_removed_when_provider_times_out() {
        let bin = tempfile::tempdir().unwrap();
        let staging = tempfile::tempdir().unwrap();
        let provider = script_provider(bin.path(), "sleep 5")
            .with_staging_root(staging.path())
            .with_timeout(Duration::from_millis(300));

        let err = provider
            .export_structured(&source(), &week(), &ExportOptions::full())
            .await
            .unwrap_err();

        assert!(matches!(err, CalMergeError::ProviderTimeout(_)), "Got: {err:?}");
        assert_eq!(staging_dirs_left(staging.path()), 0);
    }

    #[test]
    fn test_binary_name_follows_convention() {
        let provider = SubprocessProvider::from_name("outlook");
        assert_eq!(provider.binary_name(), "calmerge-provider-outlook");
    }

    #[tokio::test]
    async fn test_missing_binary_is_provider_not_installed() {
        let provider = SubprocessProvider::from_name("definitely-not-installed-xyz");
        let err = provider.list_sources().await.unwrap_err();
        assert!(
            matches!(
                err,
                CalMergeError::ProviderNotInstalled(ref name)
                    if name == "calmerge-provider-definitely-not-installed-xyz"
            ),
            "Got: {err:?}"
        );
    }
}
