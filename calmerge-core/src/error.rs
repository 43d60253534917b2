//! Error types for calmerge.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors that can occur in calmerge operations.
///
/// Per-source failures (`Provider`, `ProviderTimeout`, `IcsParse`,
/// `ItemMalformed`) are absorbed by the extraction strategy and turned into
/// outcome data. Only output failures reach the caller of a merge run.
#[derive(Error, Debug)]
pub enum CalMergeError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Provider '{0}' not found in PATH")]
    ProviderNotInstalled(String),

    #[error("Provider request timed out after {0}s")]
    ProviderTimeout(u64),

    #[error("ICS parse error: {0}")]
    IcsParse(String),

    #[error("Malformed item: {0}")]
    ItemMalformed(String),

    #[error("Invalid date window: {start} is after {end}")]
    InvalidWindow {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("Refusing to overwrite existing file: {}", .0.display())]
    OutputExists(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for calmerge operations.
pub type CalMergeResult<T> = Result<T, CalMergeError>;
