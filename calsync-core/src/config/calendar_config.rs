//! Per-calendar configuration for directory-backed calendars.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CalSyncError, CalSyncResult};

const CONFIG_FILE: &str = ".calsync/config.toml";

/// Configuration stored in each calendar's .calsync/config.toml
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct CalendarConfig {
    /// Display name; the directory name is used when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// The owner's address, used to find their own attendee entry
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_email: Option<String>,

    #[serde(default)]
    pub read_only: bool,
}

impl CalendarConfig {
    /// Load config from .calsync/config.toml, falling back to defaults
    pub fn load(calendar_dir: &Path) -> CalSyncResult<Self> {
        let path = calendar_dir.join(CONFIG_FILE);

        if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            let config: CalendarConfig =
                toml::from_str(&content).map_err(|e| CalSyncError::Config(e.to_string()))?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to .calsync/config.toml
    pub fn save(&self, calendar_dir: &Path) -> CalSyncResult<()> {
        let path = calendar_dir.join(CONFIG_FILE);
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }

        let content =
            toml::to_string_pretty(self).map_err(|e| CalSyncError::Config(e.to_string()))?;

        std::fs::write(&path, content)?;

        Ok(())
    }
}
