//! Global calmerge configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, File};
use serde::{Deserialize, Serialize};

use crate::error::{CalMergeError, CalMergeResult};

static DEFAULT_OUTPUT_DIR: &str = "~/Desktop";
static DEFAULT_PROVIDER: &str = "ics";
static DEFAULT_LOG_LEVEL: &str = "warn";
const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 60;

fn default_output_dir() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_DIR)
}

fn default_provider() -> String {
    DEFAULT_PROVIDER.to_string()
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_provider_timeout_secs() -> u64 {
    DEFAULT_PROVIDER_TIMEOUT_SECS
}

/// Configuration at ~/.config/calmerge/config.toml
///
/// Provider-specific settings live under
/// ~/.config/calmerge/providers/<name>/ and are read by the provider itself.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CalmergeConfig {
    /// Where merged calendars are written unless an explicit path is given
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Provider binary suffix, i.e. `calmerge-provider-<provider>`
    #[serde(default = "default_provider")]
    pub provider: String,

    #[serde(default = "default_provider_timeout_secs")]
    pub provider_timeout_secs: u64,

    /// Written as X-WR-CALNAME in the merged calendar
    #[serde(default)]
    pub calendar_name: Option<String>,

    /// tracing filter directive used when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for CalmergeConfig {
    fn default() -> Self {
        CalmergeConfig {
            output_dir: default_output_dir(),
            provider: default_provider(),
            provider_timeout_secs: default_provider_timeout_secs(),
            calendar_name: None,
            log_level: default_log_level(),
        }
    }
}

impl CalmergeConfig {
    /// ~/.config/calmerge
    pub fn config_dir() -> CalMergeResult<PathBuf> {
        Ok(dirs::config_dir()
            .ok_or_else(|| CalMergeError::Config("Could not determine config directory".into()))?
            .join("calmerge"))
    }

    pub fn config_path() -> CalMergeResult<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load the global config, writing a commented-out default on first run.
    pub fn load() -> CalMergeResult<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
        }

        Self::load_from(&config_path)
    }

    /// Load from an explicit path. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> CalMergeResult<Self> {
        Config::builder()
            .add_source(File::from(path.to_path_buf()).required(false))
            .build()
            .map_err(|e| CalMergeError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| CalMergeError::Config(e.to_string()))
    }

    /// `output_dir` with `~` expanded.
    pub fn output_dir(&self) -> PathBuf {
        let full_path_str = shellexpand::tilde(&self.output_dir.to_string_lossy()).into_owned();
        PathBuf::from(full_path_str)
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs)
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> CalMergeResult<()> {
        let contents = format!(
            "\
# calmerge configuration

# Where merged calendars are written:
# output_dir = \"{DEFAULT_OUTPUT_DIR}\"

# Which provider to ask for calendars (runs calmerge-provider-<name>):
# provider = \"{DEFAULT_PROVIDER}\"

# Seconds to wait for a single provider request:
# provider_timeout_secs = {DEFAULT_PROVIDER_TIMEOUT_SECS}

# Name shown for the merged calendar in calendar apps:
# calendar_name = \"Merged\"

# Log filter when RUST_LOG is not set:
# log_level = \"{DEFAULT_LOG_LEVEL}\"
"
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                CalMergeError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| CalMergeError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }
}
