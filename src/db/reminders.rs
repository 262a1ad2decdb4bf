//! Reminder reads and the one write the scheduler owns: `pending -> sent`.

use super::{now_ms, Database};
use crate::error::Result;
use crate::types::{DueReminder, NotificationType, Reminder, ReminderStatus};
use rusqlite::{params, Row};

fn parse_reminder_row(row: &Row) -> rusqlite::Result<Reminder> {
    let notification_type: String = row.get("notification_type")?;
    let status: String = row.get("status")?;
    Ok(Reminder {
        id: row.get("id")?,
        task_id: row.get("task_id")?,
        reminder_time: row.get("reminder_time")?,
        notification_type: NotificationType::from_str(&notification_type)
            .unwrap_or(NotificationType::InApp),
        status: ReminderStatus::from_str(&status).unwrap_or(ReminderStatus::Pending),
        created_at: row.get("created_at")?,
    })
}

impl Database {
    /// Pending reminders whose time has come, earliest first, capped at
    /// `limit`. Joined with the owning task for its title; a reminder whose
    /// task was deleted no longer exists (cascade), so the join drops nothing.
    pub fn fetch_due_reminders(&self, now_ms: i64, limit: u32) -> Result<Vec<DueReminder>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT r.id, r.task_id, r.reminder_time, r.notification_type,
                        r.status, r.created_at, t.title AS task_title
                 FROM reminders r
                 JOIN tasks t ON t.id = r.task_id
                 WHERE r.status = 'pending' AND r.reminder_time <= ?1
                 ORDER BY r.reminder_time ASC
                 LIMIT ?2",
            )?;

            let due = stmt
                .query_map(params![now_ms, limit], |row| {
                    Ok(DueReminder {
                        reminder: parse_reminder_row(row)?,
                        task_title: row.get("task_title")?,
                    })
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            Ok(due)
        })
    }

    /// Transition a reminder from `pending` to `sent`. Returns whether a row
    /// actually changed; already-sent or deleted reminders are a no-op so
    /// duplicate ticks and restart recovery stay idempotent.
    pub fn mark_reminder_sent(&self, reminder_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE reminders SET status = 'sent'
                 WHERE id = ?1 AND status = 'pending'",
                params![reminder_id],
            )?;
            Ok(changed > 0)
        })
    }

    /// Create a reminder. Owned by the task-management layer; shared write
    /// path for tests.
    pub fn create_reminder(
        &self,
        id: &str,
        task_id: &str,
        reminder_time: i64,
        notification_type: NotificationType,
    ) -> Result<Reminder> {
        let now = now_ms();
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO reminders (id, task_id, reminder_time, notification_type, status, created_at)
                 VALUES (?1, ?2, ?3, ?4, 'pending', ?5)",
                params![id, task_id, reminder_time, notification_type.as_str(), now],
            )?;
            Ok(())
        })?;

        Ok(Reminder {
            id: id.to_string(),
            task_id: task_id.to_string(),
            reminder_time,
            notification_type,
            status: ReminderStatus::Pending,
            created_at: now,
        })
    }

    pub fn get_reminder(&self, reminder_id: &str) -> Result<Option<Reminder>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT * FROM reminders WHERE id = ?1")?;
            match stmt.query_row(params![reminder_id], parse_reminder_row) {
                Ok(reminder) => Ok(Some(reminder)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
    }
}
