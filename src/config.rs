//! Scheduler configuration.
//!
//! Two scalar knobs own this subsystem's surface: whether the scheduler runs
//! at all, and how often it polls. Both come from the environment with CLI
//! overrides applied in `main`.

use crate::error::{Error, Result};
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable names.
pub const ENV_ENABLED: &str = "SCHEDULER_ENABLED";
pub const ENV_INTERVAL_MINUTES: &str = "REMINDER_CHECK_INTERVAL_MINUTES";
pub const ENV_DB_PATH: &str = "SCHEDULER_DB_PATH";

/// Default polling cadence in minutes.
pub const DEFAULT_INTERVAL_MINUTES: u64 = 5;

/// Default cap on reminders/tasks fetched per tick. Bounds per-tick work;
/// anything past the cap is picked up on the next tick.
pub const DEFAULT_FETCH_LIMIT: u32 = 100;

/// Runtime configuration for the scheduler.
#[derive(Debug, Clone)]
pub struct Config {
    /// When false, `start()` is a logged no-op.
    pub enabled: bool,
    /// Fixed cadence between ticks, in minutes. Must be positive.
    pub interval_minutes: u64,
    /// Per-tick fetch cap for each of the two read queries. Must be positive.
    pub fetch_limit: u32,
    /// Path to the SQLite database file.
    pub db_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_minutes: DEFAULT_INTERVAL_MINUTES,
            fetch_limit: DEFAULT_FETCH_LIMIT,
            db_path: PathBuf::from("reminders.db"),
        }
    }
}

impl Config {
    /// Build a config from the environment, falling back to defaults for
    /// unset variables. Malformed values are a configuration error, not a
    /// silent fallback.
    pub fn from_env() -> Result<Self> {
        let mut config = Config::default();

        if let Ok(raw) = std::env::var(ENV_ENABLED) {
            config.enabled = parse_bool(ENV_ENABLED, &raw)?;
        }
        if let Ok(raw) = std::env::var(ENV_INTERVAL_MINUTES) {
            config.interval_minutes = raw.trim().parse().map_err(|_| {
                Error::Configuration(format!(
                    "{} must be a positive integer, got {:?}",
                    ENV_INTERVAL_MINUTES, raw
                ))
            })?;
        }
        if let Ok(raw) = std::env::var(ENV_DB_PATH) {
            config.db_path = PathBuf::from(raw);
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the loop must not start with.
    pub fn validate(&self) -> Result<()> {
        if self.interval_minutes == 0 {
            return Err(Error::Configuration(
                "polling interval must be at least 1 minute".into(),
            ));
        }
        if self.fetch_limit == 0 {
            return Err(Error::Configuration(
                "per-tick fetch limit must be positive".into(),
            ));
        }
        Ok(())
    }

    /// The inter-tick sleep. Saturates rather than overflowing for absurdly
    /// large intervals.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_minutes.saturating_mul(60))
    }
}

fn parse_bool(name: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::Configuration(format!(
            "{} must be a boolean, got {:?}",
            name, raw
        ))),
    }
}
