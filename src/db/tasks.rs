//! Task reads for the scheduler, plus the narrow writes the surrounding CRUD
//! layer performs on the same store.

use super::{now_ms, Database};
use crate::error::Result;
use crate::types::{Task, TaskStatus};
use rusqlite::{params, Row};

/// An in-progress task with a time estimate, as returned by the deadline
/// fetch. `updated_at` is when the task last entered `in_progress`.
#[derive(Debug, Clone)]
pub struct EstimatedTask {
    pub id: String,
    pub title: String,
    pub estimated_hours: f64,
    pub updated_at: i64,
}

fn parse_task_row(row: &Row) -> rusqlite::Result<Task> {
    let status: String = row.get("status")?;
    Ok(Task {
        id: row.get("id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        status: TaskStatus::from_str(&status).unwrap_or(TaskStatus::Pending),
        estimated_hours: row.get("estimated_hours")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

impl Database {
    /// Tasks that are `in_progress` with a positive time estimate, capped at
    /// `limit`. No side effects.
    pub fn fetch_in_progress_tasks_with_estimate(
        &self,
        limit: u32,
    ) -> Result<Vec<EstimatedTask>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, title, estimated_hours, updated_at
                 FROM tasks
                 WHERE status = 'in_progress'
                   AND estimated_hours IS NOT NULL
                   AND estimated_hours > 0
                 LIMIT ?1",
            )?;

            let tasks = stmt
                .query_map(params![limit], |row| {
                    Ok(EstimatedTask {
                        id: row.get(0)?,
                        title: row.get(1)?,
                        estimated_hours: row.get(2)?,
                        updated_at: row.get(3)?,
                    })
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            Ok(tasks)
        })
    }

    /// Create a task. Owned by the CRUD layer; exists here so tests and the
    /// surrounding application share one write path.
    pub fn create_task(
        &self,
        id: &str,
        title: &str,
        status: TaskStatus,
        estimated_hours: Option<f64>,
    ) -> Result<Task> {
        let now = now_ms();
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO tasks (id, title, status, estimated_hours, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                params![id, title, status.as_str(), estimated_hours, now],
            )?;
            Ok(())
        })?;

        Ok(Task {
            id: id.to_string(),
            title: title.to_string(),
            description: None,
            status,
            estimated_hours,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn get_task(&self, task_id: &str) -> Result<Option<Task>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT * FROM tasks WHERE id = ?1")?;
            match stmt.query_row(params![task_id], parse_task_row) {
                Ok(task) => Ok(Some(task)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
    }

    /// Move a task to a new status, bumping `updated_at`. The bump is what
    /// anchors the deadline clock and the estimated-time dedup scope.
    pub fn set_task_status(&self, task_id: &str, status: TaskStatus) -> Result<bool> {
        self.set_task_status_at(task_id, status, now_ms())
    }

    /// Like [`set_task_status`](Self::set_task_status) with an explicit
    /// transition timestamp, for tests that need to backdate the clock.
    pub fn set_task_status_at(
        &self,
        task_id: &str,
        status: TaskStatus,
        at_ms: i64,
    ) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE tasks SET status = ?2, updated_at = ?3 WHERE id = ?1",
                params![task_id, status.as_str(), at_ms],
            )?;
            Ok(changed > 0)
        })
    }

    /// Delete a task. Reminders cascade away; notifications keep their rows
    /// with nulled references.
    pub fn delete_task(&self, task_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute("DELETE FROM tasks WHERE id = ?1", params![task_id])?;
            Ok(changed > 0)
        })
    }
}
