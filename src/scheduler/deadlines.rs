//! Deadline evaluator: in-progress tasks whose time estimate has run out.

use crate::db::tasks::EstimatedTask;
use crate::types::{NotificationCategory, NotificationIntent, NotificationType};

/// Fire slightly before the exact crossing so a poll that lands just short
/// of the boundary does not push the alert a whole interval later.
pub const ESTIMATE_GRACE_MS: i64 = 60_000;

const MS_PER_HOUR: f64 = 3_600_000.0;

/// One intent per task whose elapsed in-progress time has reached its
/// estimate. The evaluator has no memory of earlier ticks; the at-most-once
/// guarantee comes from the dedup probe downstream.
pub fn evaluate(tasks: &[EstimatedTask], now_ms: i64) -> Vec<NotificationIntent> {
    tasks
        .iter()
        .filter(|task| estimate_reached(task, now_ms))
        .map(intent_for)
        .collect()
}

fn estimate_reached(task: &EstimatedTask, now_ms: i64) -> bool {
    let estimate_ms = (task.estimated_hours * MS_PER_HOUR) as i64;
    now_ms >= task.updated_at + estimate_ms - ESTIMATE_GRACE_MS
}

fn intent_for(task: &EstimatedTask) -> NotificationIntent {
    let unit = if (task.estimated_hours - 1.0).abs() < f64::EPSILON {
        "hour"
    } else {
        "hours"
    };
    NotificationIntent {
        category: NotificationCategory::EstimatedTime,
        task_id: task.id.clone(),
        reminder_id: None,
        notification_type: NotificationType::InApp,
        title: format!("Estimated Time Complete: {}", task.title),
        message: format!(
            "The estimated time ({} {}) for '{}' has been reached.",
            task.estimated_hours, unit, task.title
        ),
        in_progress_since: Some(task.updated_at),
    }
}
