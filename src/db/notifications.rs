//! Notification inserts and the dedup existence probe.
//!
//! Both operations classify a missing `notifications` relation as
//! `StoreUnavailable` so a tick against an unprovisioned schema degrades
//! instead of crashing.

use super::{now_ms, Database};
use crate::error::Result;
use crate::types::{Notification, NotificationCategory, NotificationIntent, NotificationType};
use rusqlite::{params, Row};

/// Identity of a would-be notification for the at-most-once check.
///
/// `reminder` notifications key on the reminder id. `estimated_time`
/// notifications key on the task id, scoped to rows created at or after the
/// task's last transition into `in_progress` so the limit re-arms when the
/// task leaves and re-enters that status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupKey<'a> {
    Reminder { reminder_id: &'a str },
    EstimatedTime { task_id: &'a str, since_ms: i64 },
}

impl<'a> DedupKey<'a> {
    /// Derive the dedup key for an intent, if the category carries one.
    pub fn for_intent(intent: &'a NotificationIntent) -> Option<Self> {
        match intent.category {
            NotificationCategory::Reminder => {
                intent.reminder_id.as_deref().map(|reminder_id| {
                    DedupKey::Reminder { reminder_id }
                })
            }
            NotificationCategory::EstimatedTime => Some(DedupKey::EstimatedTime {
                task_id: &intent.task_id,
                since_ms: intent.in_progress_since.unwrap_or(0),
            }),
            // No producer for due_date notifications yet; nothing to dedup.
            NotificationCategory::DueDate => None,
        }
    }
}

fn parse_notification_row(row: &Row) -> rusqlite::Result<Notification> {
    let notification_type: String = row.get("notification_type")?;
    let category: String = row.get("notification_category")?;
    let is_read: i64 = row.get("is_read")?;
    Ok(Notification {
        id: row.get("id")?,
        task_id: row.get("task_id")?,
        reminder_id: row.get("reminder_id")?,
        notification_type: NotificationType::from_str(&notification_type)
            .unwrap_or(NotificationType::InApp),
        title: row.get("title")?,
        message: row.get("message")?,
        category: NotificationCategory::from_str(&category)
            .unwrap_or(NotificationCategory::Reminder),
        is_read: is_read != 0,
        created_at: row.get("created_at")?,
    })
}

impl Database {
    /// Whether a notification already satisfies the given dedup key.
    pub fn notification_exists(&self, key: DedupKey<'_>) -> Result<bool> {
        self.with_conn(|conn| {
            let exists: bool = match key {
                DedupKey::Reminder { reminder_id } => conn.query_row(
                    "SELECT EXISTS(
                         SELECT 1 FROM notifications
                         WHERE notification_category = 'reminder' AND reminder_id = ?1)",
                    params![reminder_id],
                    |row| row.get(0),
                )?,
                DedupKey::EstimatedTime { task_id, since_ms } => conn.query_row(
                    "SELECT EXISTS(
                         SELECT 1 FROM notifications
                         WHERE notification_category = 'estimated_time'
                           AND task_id = ?1 AND created_at >= ?2)",
                    params![task_id, since_ms],
                    |row| row.get(0),
                )?,
            };
            Ok(exists)
        })
    }

    /// Append a notification for a surviving intent. Single-row insert; the
    /// store provides whatever atomicity this needs.
    pub fn insert_notification(&self, intent: &NotificationIntent) -> Result<Notification> {
        let now = now_ms();
        let id = self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO notifications
                     (task_id, reminder_id, notification_type, title, message,
                      notification_category, is_read, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7)",
                params![
                    intent.task_id,
                    intent.reminder_id,
                    intent.notification_type.as_str(),
                    intent.title,
                    intent.message,
                    intent.category.as_str(),
                    now
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })?;

        Ok(Notification {
            id,
            task_id: Some(intent.task_id.clone()),
            reminder_id: intent.reminder_id.clone(),
            notification_type: intent.notification_type,
            title: intent.title.clone(),
            message: intent.message.clone(),
            category: intent.category,
            is_read: false,
            created_at: now,
        })
    }

    /// All notifications, newest first. The listing API and tests read
    /// through this; the scheduler itself never does.
    pub fn list_notifications(&self) -> Result<Vec<Notification>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT * FROM notifications ORDER BY created_at DESC, id DESC",
            )?;
            let notifications = stmt
                .query_map([], parse_notification_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(notifications)
        })
    }
}
