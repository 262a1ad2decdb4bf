//! Reminder scheduler binary.

use anyhow::Result;
use clap::Parser;
use reminder_scheduler::cli::{Cli, Command};
use reminder_scheduler::config::Config;
use reminder_scheduler::db::{now_ms, Database};
use reminder_scheduler::scheduler::{run_tick, Scheduler};
use std::fs::OpenOptions;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on --log option
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    match cli.log.as_str() {
        "0" | "off" => {
            // No logging
        }
        "1" | "stdout" => {
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(std::io::stdout)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        "2" | "stderr" => {
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(std::io::stderr)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        filename => {
            // Log to file (append mode)
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(filename)?;
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(file)
                .with_ansi(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }

    // Environment config with CLI overrides
    let mut config = Config::from_env()?;
    if let Some(db_path) = &cli.database {
        config.db_path = db_path.into();
    }
    if let Some(interval) = cli.interval {
        config.interval_minutes = interval;
    }
    config.validate()?;

    info!(
        "Starting reminder scheduler v{}",
        env!("CARGO_PKG_VERSION")
    );
    info!("Database: {:?}", config.db_path);

    let db = Database::open(&config.db_path)?;

    match cli.command {
        Some(Command::Tick) => {
            let report = run_tick(&db, config.fetch_limit, now_ms());
            println!(
                "Tick complete: {} reminder(s), {} estimate crossing(s), {} duplicate(s) skipped, {} failure(s)",
                report.reminders_sent,
                report.estimates_reached,
                report.duplicates_skipped,
                report.failures
            );
            if report.store_unavailable {
                println!("Store unavailable: notification writes were deferred");
            }
        }
        Some(Command::Serve) | None => {
            let mut scheduler = Scheduler::new(db, config);
            scheduler.start()?;
            if !scheduler.is_running() {
                // Disabled via config; nothing to wait for.
                return Ok(());
            }

            info!("Scheduler running, press Ctrl-C to stop");
            tokio::signal::ctrl_c().await?;
            info!("Shutdown requested");
            scheduler.stop().await;
        }
    }

    Ok(())
}
