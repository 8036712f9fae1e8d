use anyhow::Result;
use calsync_core::SyncConfig;
use owo_colors::OwoColorize;

pub fn run(config: &SyncConfig) -> Result<()> {
    let config_path = SyncConfig::config_path()?;

    println!("{}", "Paths".bold());
    println!("  Config:     {}", config_path.display());
    println!("  Calendars:  {}", config.calendar_path().display());

    let interval = if config.sync_interval_minutes == 0 {
        "manual".to_string()
    } else {
        format!("every {} min", config.sync_interval_minutes)
    };
    let calendars = if config.calendars.is_empty() {
        "(none)".dimmed().to_string()
    } else {
        config.calendars.join(", ")
    };

    println!();
    println!("{}", "Sync".bold());
    println!("  Calendars:    {}", calendars);
    println!("  Placeholder:  {}", config.placeholder_title);
    println!("  Lookahead:    {} days", config.lookahead_days);
    println!("  Interval:     {}", interval);

    Ok(())
}
