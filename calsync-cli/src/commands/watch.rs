use std::time::Duration;

use anyhow::Result;
use calsync_core::{LocalBackend, Orchestrator, SyncConfig, SyncSummary};
use owo_colors::OwoColorize;
use tracing::warn;

use crate::commands::participating_calendars;
use crate::render::SummaryRender;
use crate::singleton;

/// One week.
pub const MAX_INTERVAL_MINUTES: u64 = 7 * 24 * 60;

fn period(minutes: u64) -> Result<Duration> {
    if minutes == 0 {
        anyhow::bail!(
            "No sync interval configured.\n\n\
            Set sync_interval_minutes in the config, or pass --interval <MINUTES>."
        );
    }
    if minutes > MAX_INTERVAL_MINUTES {
        anyhow::bail!(
            "Sync interval of {} minutes is too long (at most {}).",
            minutes,
            MAX_INTERVAL_MINUTES
        );
    }
    Ok(Duration::from_secs(minutes.saturating_mul(60)))
}

pub async fn run(mut config: SyncConfig, interval: Option<u64>) -> Result<()> {
    let minutes = interval.unwrap_or(config.sync_interval_minutes);
    let every = period(minutes)?;
    participating_calendars(&config, &[])?;
    let calendar_dir = config.calendar_path();
    let _lock = singleton::acquire_lock(&calendar_dir)?;

    println!(
        "Syncing every {} {} (Ctrl-C to stop)",
        minutes,
        if minutes == 1 { "minute" } else { "minutes" }
    );

    let mut ticker = tokio::time::interval(every);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => break,
        }

        // Pick up config edits between runs
        match SyncConfig::load() {
            // The lock only covers the directory it was taken for
            Ok(fresh) if fresh.calendar_path() != calendar_dir => warn!(
                calendar_dir = %fresh.calendar_path().display(),
                "calendar_dir changed, restart watch to pick it up"
            ),
            Ok(fresh) => config = fresh,
            Err(e) => warn!(error = %e, "Could not reload config, keeping the previous one"),
        }
        let calendars = match participating_calendars(&config, &[]) {
            Ok(calendars) => calendars,
            Err(e) => {
                println!("{}", e.to_string().red());
                continue;
            }
        };

        let orchestrator = Orchestrator::from_config(LocalBackend::from_config(&config), &config);
        let run = orchestrator.run(&calendars, None, None, false);
        tokio::pin!(run);

        let (result, interrupted) = tokio::select! {
            result = &mut run => (result, false),
            _ = tokio::signal::ctrl_c() => {
                // Let the current pair finish so no placeholder is left half-written
                orchestrator.request_stop();
                (run.await, true)
            }
        };

        report(result);
        if interrupted {
            break;
        }
    }

    println!("Stopped");
    Ok(())
}

fn report(result: calsync_core::CalSyncResult<SyncSummary>) {
    let stamp = chrono::Local::now().format("%H:%M");
    match result {
        Ok(summary) if summary.total_changes() == 0 && !summary.has_errors() => {
            println!("{} {}", stamp.dimmed(), "In sync".dimmed());
        }
        Ok(summary) => {
            println!("{}", stamp.dimmed());
            println!("{}", summary.render_with(false));
        }
        Err(e) => println!("{} {}", stamp.dimmed(), e.to_string().red()),
    }
}
