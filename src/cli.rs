//! CLI definitions for the reminder scheduler binary.

use clap::{Parser, Subcommand};

/// Reminder & notification scheduler for the task store
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to database file (overrides SCHEDULER_DB_PATH)
    #[arg(short, long, global = true)]
    pub database: Option<String>,

    /// Polling interval in minutes (overrides REMINDER_CHECK_INTERVAL_MINUTES)
    #[arg(short, long, global = true)]
    pub interval: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the scheduler loop until interrupted (default if no subcommand given)
    Serve,

    /// Run a single evaluation pass and exit
    Tick,
}
