//! Error taxonomy for the scheduler.
//!
//! The store distinguishes "the backing relation is missing or unreachable"
//! from ordinary write hiccups because the two recover differently: an
//! unavailable store skips the rest of the tick, a transient failure defers
//! only the one item it hit.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The backing relation is absent (schema not provisioned) or the store
    /// is unreachable. Never fatal to the loop; the tick degrades.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// A single read/write failed for a reason expected to clear on its own.
    /// State is left unchanged so the next tick retries naturally.
    #[error("transient store failure: {0}")]
    TransientWrite(rusqlite::Error),

    /// Invalid configuration. Fatal at startup; the loop must not start.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// Schema migration failed while opening the database.
    #[error("migration failed: {0}")]
    Migration(#[from] Box<refinery::Error>),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        if is_missing_relation(&err) {
            Error::StoreUnavailable(err.to_string())
        } else {
            Error::TransientWrite(err)
        }
    }
}

impl From<refinery::Error> for Error {
    fn from(err: refinery::Error) -> Self {
        Error::Migration(Box::new(err))
    }
}

/// SQLite reports a missing relation as a prepare-time failure whose message
/// starts with "no such table". That is the only signal available without
/// introspecting the schema on every call.
fn is_missing_relation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(_, Some(msg)) => msg.contains("no such table"),
        _ => false,
    }
}

impl Error {
    /// Whether the store itself (not one item) should be treated as down for
    /// the remainder of the tick.
    pub fn is_store_unavailable(&self) -> bool {
        matches!(self, Error::StoreUnavailable(_))
    }
}
