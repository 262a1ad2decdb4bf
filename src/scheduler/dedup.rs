//! Notification deduplicator.
//!
//! The persisted notification rows are the sole memory of what already
//! fired; there is no in-process cursor, so restarts and overlapping ticks
//! cannot desynchronize it. The check-then-insert pair is only serialized
//! within a single scheduler instance; running two instances concurrently
//! can race it and is not a supported configuration.

use crate::db::notifications::DedupKey;
use crate::db::Database;
use crate::error::Result;
use crate::types::NotificationIntent;

/// Whether a notification for this intent already exists. Intents without a
/// dedup key (no producer defines one yet) always pass through.
pub fn is_duplicate(db: &Database, intent: &NotificationIntent) -> Result<bool> {
    match DedupKey::for_intent(intent) {
        Some(key) => db.notification_exists(key),
        None => Ok(false),
    }
}
