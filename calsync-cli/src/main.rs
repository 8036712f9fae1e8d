mod commands;
mod render;
mod singleton;
mod utils;

use anyhow::Result;
use calsync_core::{SyncConfig, SyncWindow};
use clap::{ArgAction, Parser, Subcommand};
use commands::watch::MAX_INTERVAL_MINUTES;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "calsync")]
#[command(about = "Mirror busy time between your calendars as opaque placeholders")]
struct Cli {
    /// Log what calsync is doing to stderr (-vv for more)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile the participating calendars once
    Sync {
        /// Show what would change without writing anything
        #[arg(long)]
        dry_run: bool,

        /// Sync events from this date (YYYY-MM-DD, default today)
        #[arg(long)]
        from: Option<String>,

        /// Number of days to sync (default from config)
        #[arg(long)]
        days: Option<u32>,

        /// Only sync these calendars (repeatable, at least two)
        #[arg(short, long)]
        calendar: Vec<String>,

        /// Print the run summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Sync repeatedly until interrupted
    Watch {
        /// Minutes between syncs (default from config)
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..=MAX_INTERVAL_MINUTES))]
        interval: Option<u64>,
    },
    /// List calendars in the calendar directory
    Calendars,
    /// Show configuration paths and values
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = SyncConfig::load()?;

    match cli.command {
        Commands::Sync {
            dry_run,
            from,
            days,
            calendar,
            json,
        } => {
            let window = SyncWindow::from_args(from.as_deref(), days, config.lookahead_days)
                .map_err(|e| anyhow::anyhow!(e))?;
            let options = commands::sync::SyncOptions {
                calendars: calendar,
                window,
                dry_run,
                json,
                verbose: cli.verbose > 0,
            };
            commands::sync::run(&config, options).await
        }
        Commands::Watch { interval } => commands::watch::run(config, interval).await,
        Commands::Calendars => commands::calendars::run(&config).await,
        Commands::Config => commands::config::run(&config),
    }
}

/// `RUST_LOG` wins; otherwise each `-v` lowers the level from warn.
fn init_tracing(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("calsync_core={0},calsync_cli={0}", default_level))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
