//! Defines the JSON protocol used for communication between calmerge
//! and provider binaries over stdin/stdout.
//!
//! One request per line on stdin, one response per line on stdout.

use std::path::PathBuf;

use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::date_window::DateWindow;
use crate::provider::{ExportOptions, ItemQuery, RawItem};
use crate::source::CalendarSourceHandle;

pub trait ProviderCommand: Serialize {
    type Response: DeserializeOwned;
    fn command() -> Command;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    ListSources,
    ExportStructured,
    ListItems,
}

/// Request sent from calmerge to provider.
#[derive(Debug, Serialize, Deserialize)]
pub struct Request {
    pub command: Command,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Response sent from provider to calmerge.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Response<T> {
    Success { data: T },
    Error { error: String },
}

impl<T: Serialize> Response<T> {
    pub fn success(data: T) -> String {
        serde_json::to_string(&Response::Success { data }).unwrap_or_else(|e| {
            Response::<()>::error(&format!("Failed to serialize response: {e}"))
        })
    }
}

impl Response<()> {
    pub fn error(msg: &str) -> String {
        let error = serde_json::Value::String(msg.to_string());
        format!(r#"{{"status":"error","error":{error}}}"#)
    }
}

/// Discover the calendars the provider can serve.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ListSources {}

impl ProviderCommand for ListSources {
    type Response = Vec<CalendarSourceHandle>;
    fn command() -> Command {
        Command::ListSources
    }
}

/// Export one source for a window as an .ics file.
///
/// The provider writes the document to `output_path`, a staging location
/// owned by the caller, and responds with nothing.
#[derive(Debug, Serialize, Deserialize)]
pub struct ExportStructured {
    pub source: CalendarSourceHandle,
    pub window: DateWindow,
    pub options: ExportOptions,
    pub output_path: PathBuf,
}

impl ProviderCommand for ExportStructured {
    type Response = ();
    fn command() -> Command {
        Command::ExportStructured
    }
}

/// Enumerate raw items of one source.
#[derive(Debug, Serialize, Deserialize)]
pub struct ListItems {
    pub source: CalendarSourceHandle,
    pub query: ItemQuery,
}

impl ProviderCommand for ListItems {
    type Response = Vec<RawItem>;
    fn command() -> Command {
        Command::ListItems
    }
}
