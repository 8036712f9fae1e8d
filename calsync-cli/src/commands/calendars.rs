use anyhow::Result;
use calsync_core::{CalendarBackend, LocalBackend, SyncConfig};
use owo_colors::OwoColorize;

use crate::render::Render;

pub async fn run(config: &SyncConfig) -> Result<()> {
    let backend = LocalBackend::from_config(config);
    let calendars = backend.list_calendars().await?;

    if calendars.is_empty() {
        println!(
            "No calendars found in {}\n\nEach calendar is a directory of .ics files.",
            backend.root().display()
        );
        return Ok(());
    }

    for calendar in &calendars {
        let syncing = config.calendars.iter().any(|id| id == &calendar.id);
        let status = if syncing {
            "syncing".green().to_string()
        } else {
            String::new()
        };

        if calendar.title == calendar.id {
            println!("{} {}", calendar.render(), status);
        } else {
            let title = format!("({})", calendar.title);
            println!("{} {} {}", calendar.render(), title.dimmed(), status);
        }
    }

    // Configured calendars that don't exist on disk would fail every run
    for id in &config.calendars {
        if !calendars.iter().any(|c| &c.id == id) {
            println!("{} {}", id.red(), "(configured, but not found)".dimmed());
        }
    }

    Ok(())
}
