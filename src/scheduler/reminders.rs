//! Reminder evaluator: due reminders become notification intents.

use crate::types::{DueReminder, NotificationCategory, NotificationIntent};

/// One intent per due reminder, in the order the fetch returned them
/// (`reminder_time` ascending). Persisting earliest-due first means a crash
/// mid-tick loses only the later ones.
///
/// Already-sent reminders never reach this function; the fetch excludes them
/// structurally.
pub fn evaluate(due: &[DueReminder]) -> Vec<NotificationIntent> {
    due.iter().map(intent_for).collect()
}

fn intent_for(due: &DueReminder) -> NotificationIntent {
    let reminder = &due.reminder;
    NotificationIntent {
        category: NotificationCategory::Reminder,
        task_id: reminder.task_id.clone(),
        reminder_id: Some(reminder.id.clone()),
        notification_type: reminder.notification_type,
        title: format!("Reminder: {}", due.task_title),
        message: format!(
            "Time to work on: {} ({} reminder)",
            due.task_title,
            reminder.notification_type.as_str()
        ),
        in_progress_since: None,
    }
}
