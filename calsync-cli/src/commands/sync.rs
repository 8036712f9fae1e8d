use anyhow::Result;
use calsync_core::{LocalBackend, Orchestrator, SyncConfig, SyncWindow};
use owo_colors::OwoColorize;

use crate::commands::participating_calendars;
use crate::render::SummaryRender;
use crate::singleton;
use crate::utils::tui;

pub struct SyncOptions {
    pub calendars: Vec<String>,
    pub window: SyncWindow,
    pub dry_run: bool,
    pub json: bool,
    pub verbose: bool,
}

pub async fn run(config: &SyncConfig, options: SyncOptions) -> Result<()> {
    let calendars = participating_calendars(config, &options.calendars)?;
    let _lock = singleton::acquire_lock(&config.calendar_path())?;

    let backend = LocalBackend::from_config(config);
    let orchestrator = Orchestrator::from_config(backend, config);

    let spinner = (!options.json)
        .then(|| tui::create_spinner(format!("Syncing {}", calendars.join(", "))));
    let result = orchestrator
        .run(
            &calendars,
            Some(options.window.start),
            Some(options.window.end),
            options.dry_run,
        )
        .await;
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    let summary = result?;

    if options.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{}", summary.render_with(options.verbose));
    }

    if summary.has_errors() {
        let count = summary.all_errors().len();
        let noun = if count == 1 { "error" } else { "errors" };
        anyhow::bail!("Sync finished with {} {}", count, noun);
    }

    if options.dry_run && !options.json {
        println!("{}", "Dry run: nothing was written".dimmed());
    }

    Ok(())
}
