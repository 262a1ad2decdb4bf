//! Core types shared by the store gateway and the scheduler.

use serde::{Deserialize, Serialize};

/// Task lifecycle status. Owned by the CRUD layer; the scheduler only reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Archived,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
            TaskStatus::Archived => "archived",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(TaskStatus::Pending),
            "in_progress" => Some(TaskStatus::InProgress),
            "completed" => Some(TaskStatus::Completed),
            "archived" => Some(TaskStatus::Archived),
            _ => None,
        }
    }
}

/// Reminder status. Transitions `pending -> sent` exactly once, only by the
/// scheduler, and never back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderStatus {
    Pending,
    Sent,
}

impl ReminderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReminderStatus::Pending => "pending",
            ReminderStatus::Sent => "sent",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ReminderStatus::Pending),
            "sent" => Some(ReminderStatus::Sent),
            _ => None,
        }
    }
}

/// Delivery channel requested for a reminder. Only durable in-store records
/// are guaranteed; external channels are downstream concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    InApp,
    Email,
    Sms,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::InApp => "in_app",
            NotificationType::Email => "email",
            NotificationType::Sms => "sms",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "in_app" => Some(NotificationType::InApp),
            "email" => Some(NotificationType::Email),
            "sms" => Some(NotificationType::Sms),
            _ => None,
        }
    }
}

/// What triggered a notification. Closed set so dedup keys and rendering can
/// match exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationCategory {
    Reminder,
    EstimatedTime,
    DueDate,
}

impl NotificationCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationCategory::Reminder => "reminder",
            NotificationCategory::EstimatedTime => "estimated_time",
            NotificationCategory::DueDate => "due_date",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "reminder" => Some(NotificationCategory::Reminder),
            "estimated_time" => Some(NotificationCategory::EstimatedTime),
            "due_date" => Some(NotificationCategory::DueDate),
            _ => None,
        }
    }
}

/// A task as the scheduler sees it. Timestamps are epoch milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub estimated_hours: Option<f64>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// A scheduled one-time reminder tied to a task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reminder {
    pub id: String,
    pub task_id: String,
    pub reminder_time: i64,
    pub notification_type: NotificationType,
    pub status: ReminderStatus,
    pub created_at: i64,
}

/// A due reminder joined with its owning task's title, as returned by the
/// due-reminder fetch. The join is what makes "reminder for a deleted task"
/// structurally impossible here.
#[derive(Debug, Clone)]
pub struct DueReminder {
    pub reminder: Reminder,
    pub task_title: String,
}

/// The durable record that an event fired, as stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    pub task_id: Option<String>,
    pub reminder_id: Option<String>,
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    #[serde(rename = "notification_category")]
    pub category: NotificationCategory,
    pub is_read: bool,
    pub created_at: i64,
}

/// A notification an evaluator wants to persist. Becomes a [`Notification`]
/// only after it survives the dedup probe.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationIntent {
    pub category: NotificationCategory,
    pub task_id: String,
    pub reminder_id: Option<String>,
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    /// For `estimated_time` intents: when the task last entered
    /// `in_progress`. Scopes the dedup probe so the one-notification limit
    /// re-arms if the task leaves and re-enters that status.
    pub in_progress_since: Option<i64>,
}
