//! Global calsync configuration.

use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::{CalSyncError, CalSyncResult};

static DEFAULT_CALENDAR_DIR: &str = "~/calendar";
static DEFAULT_PLACEHOLDER_TITLE: &str = "Busy";
const DEFAULT_LOOKAHEAD_DAYS: u32 = 30;

fn default_calendar_dir() -> PathBuf {
    PathBuf::from(DEFAULT_CALENDAR_DIR)
}

fn default_placeholder_title() -> String {
    DEFAULT_PLACEHOLDER_TITLE.to_string()
}

fn default_lookahead_days() -> u32 {
    DEFAULT_LOOKAHEAD_DAYS
}

/// Global configuration at ~/.config/calsync/config.toml
///
/// Every key can be overridden with a `CALSYNC_` environment variable,
/// e.g. `CALSYNC_CALENDARS=work,home`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SyncConfig {
    /// Where calendar directories live
    #[serde(default = "default_calendar_dir")]
    pub calendar_dir: PathBuf,

    /// Participating calendar ids
    #[serde(default)]
    pub calendars: Vec<String>,

    #[serde(default = "default_placeholder_title")]
    pub placeholder_title: String,

    #[serde(default = "default_lookahead_days")]
    pub lookahead_days: u32,

    /// 0 means manual syncs only
    #[serde(default)]
    pub sync_interval_minutes: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            calendar_dir: default_calendar_dir(),
            calendars: Vec::new(),
            placeholder_title: default_placeholder_title(),
            lookahead_days: DEFAULT_LOOKAHEAD_DAYS,
            sync_interval_minutes: 0,
        }
    }
}

impl SyncConfig {
    pub fn config_path() -> CalSyncResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| CalSyncError::Config("Could not determine config directory".into()))?
            .join("calsync");

        Ok(config_dir.join("config.toml"))
    }

    /// Load the global config, creating a commented default file on first use.
    pub fn load() -> CalSyncResult<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
        }

        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> CalSyncResult<Self> {
        Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(
                Environment::with_prefix("CALSYNC")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("calendars"),
            )
            .build()
            .map_err(|e| CalSyncError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| CalSyncError::Config(e.to_string()))
    }

    /// Calendar directory with `~` expanded.
    pub fn calendar_path(&self) -> PathBuf {
        let full_path_str =
            shellexpand::tilde(&self.calendar_dir.to_string_lossy()).into_owned();

        PathBuf::from(full_path_str)
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> CalSyncResult<()> {
        let contents = format!(
            "\
# calsync configuration

# Where your calendars live (one directory per calendar):
# calendar_dir = \"{}\"

# Calendars that share busy time with each other (at least two):
# calendars = [\"work\", \"personal\"]

# Title written on placeholder events:
# placeholder_title = \"{}\"

# How many days ahead to mirror:
# lookahead_days = {}

# Minutes between syncs for `calsync watch` (0 = manual only):
# sync_interval_minutes = 0
",
            DEFAULT_CALENDAR_DIR, DEFAULT_PLACEHOLDER_TITLE, DEFAULT_LOOKAHEAD_DAYS
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                CalSyncError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| CalSyncError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }
}
