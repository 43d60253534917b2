//! Configuration for the ICS provider.
//!
//! Stored in:
//!   ~/.config/calmerge/providers/ics/config.toml
//!
//! ```toml
//! directories = ["~/Calendars", "/srv/shared/calendars"]
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Overrides the configured directories (same separator as PATH).
pub const DIRS_ENV: &str = "CALMERGE_ICS_DIRS";

fn base_dir() -> Result<PathBuf> {
    Ok(dirs::config_dir()
        .context("Could not determine config directory")?
        .join("calmerge")
        .join("providers")
        .join("ics"))
}

#[derive(Debug, Default, Deserialize)]
pub struct IcsProviderConfig {
    /// Directories whose top-level .ics files are calendar sources
    #[serde(default)]
    pub directories: Vec<PathBuf>,
}

impl IcsProviderConfig {
    pub fn load() -> Result<Self> {
        if let Some(value) = std::env::var_os(DIRS_ENV) {
            return Ok(Self::from_dirs_var(&value));
        }

        let path = base_dir()?.join("config.toml");
        if !path.exists() {
            return Ok(Self::default());
        }

        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        let mut config: IcsProviderConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;

        config.directories = config.directories.iter().map(|d| expand_home(d)).collect();
        Ok(config)
    }

    /// Directories from a PATH-style list, as given in `CALMERGE_ICS_DIRS`.
    pub fn from_dirs_var(value: &std::ffi::OsStr) -> Self {
        Self {
            directories: std::env::split_paths(value)
                .map(|d| expand_home(&d))
                .collect(),
        }
    }

    /// Where the config file lives, for error messages.
    pub fn path_hint() -> String {
        base_dir()
            .map(|d| d.join("config.toml").display().to_string())
            .unwrap_or_else(|_| "~/.config/calmerge/providers/ics/config.toml".to_string())
    }
}

fn expand_home(path: &Path) -> PathBuf {
    PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).into_owned())
}
