//! calmerge-provider-ics - serves local .ics files as calmerge calendar sources
//!
//! This binary implements the calmerge provider protocol, communicating
//! with calmerge via JSON over stdin/stdout.
//!
//! Directories to scan are read from:
//!   ~/.config/calmerge/providers/ics/config.toml
//! or from CALMERGE_ICS_DIRS when set.

mod calendar_file;
mod commands;
mod config;

use std::io::{self, BufRead, Write};

use calmerge_core::provider::protocol::{Command, ListSources, Request, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing_subscriber::EnvFilter;

use crate::config::IcsProviderConfig;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                tracing::error!("Failed to read stdin: {}", e);
                break;
            }
        };

        // Skip empty lines
        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<Request>(&line) {
            Ok(request) => handle_request(request).await,
            Err(e) => Response::error(&format!("Failed to parse request: {}", e)),
        };

        if writeln!(stdout, "{}", response)
            .and_then(|_| stdout.flush())
            .is_err()
        {
            break;
        }
    }
}

async fn handle_request(request: Request) -> String {
    let config = match IcsProviderConfig::load() {
        Ok(c) => c,
        Err(e) => return Response::error(&format!("{:#}", e)),
    };

    match request.command {
        Command::ListSources => {
            let handler = |cmd: ListSources| commands::list_sources::handle(&config, cmd);
            dispatch(request.params, handler).await
        }
        Command::ExportStructured => {
            dispatch(request.params, commands::export_structured::handle).await
        }
        Command::ListItems => dispatch(request.params, commands::list_items::handle).await,
    }
}

/// Deserialize params into a command, run it, and encode the response line.
async fn dispatch<C, R, F, Fut>(params: serde_json::Value, handler: F) -> String
where
    C: DeserializeOwned,
    R: Serialize,
    F: FnOnce(C) -> Fut,
    Fut: Future<Output = anyhow::Result<R>>,
{
    let cmd: C = match serde_json::from_value(params) {
        Ok(c) => c,
        Err(e) => return Response::error(&format!("Invalid params: {}", e)),
    };

    match handler(cmd).await {
        Ok(data) => Response::success(data),
        Err(e) => Response::error(&format!("{:#}", e)),
    }
}
