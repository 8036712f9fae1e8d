pub mod calendars;
pub mod config;
pub mod sync;
pub mod watch;

use anyhow::Result;
use calsync_core::SyncConfig;

/// Calendars to sync: explicit overrides, or the configured set.
pub fn participating_calendars(config: &SyncConfig, overrides: &[String]) -> Result<Vec<String>> {
    let calendars = if overrides.is_empty() {
        config.calendars.clone()
    } else {
        overrides.to_vec()
    };

    if calendars.len() < 2 {
        let config_path = SyncConfig::config_path()?;
        anyhow::bail!(
            "At least two calendars are needed to sync.\n\n\
            List the calendars that should share busy time in {}:\n  \
            calendars = [\"work\", \"personal\"]\n\n\
            See what is available with:\n  \
            calsync calendars",
            config_path.display()
        );
    }

    Ok(calendars)
}
