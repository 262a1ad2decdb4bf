//! Integration tests for the tick pipeline: evaluation, dedup, persistence,
//! and failure isolation against an in-memory SQLite database.

use reminder_scheduler::db::{now_ms, Database};
use reminder_scheduler::scheduler::run_tick;
use reminder_scheduler::types::{
    NotificationCategory, NotificationIntent, NotificationType, ReminderStatus, TaskStatus,
};

const HOUR_MS: i64 = 3_600_000;
const FETCH_LIMIT: u32 = 100;

/// Helper to create a fresh in-memory database for testing.
fn setup_db() -> Database {
    Database::open_in_memory().expect("Failed to create in-memory database")
}

fn ts(rfc3339: &str) -> i64 {
    chrono::DateTime::parse_from_rfc3339(rfc3339)
        .expect("valid timestamp")
        .timestamp_millis()
}

mod reminder_tests {
    use super::*;

    #[test]
    fn due_reminder_produces_one_notification_and_marks_sent() {
        let db = setup_db();
        let now = now_ms();
        db.create_task("t1", "Write report", TaskStatus::Pending, None)
            .unwrap();
        db.create_reminder("r1", "t1", now - 1_000, NotificationType::InApp)
            .unwrap();

        let report = run_tick(&db, FETCH_LIMIT, now);

        assert_eq!(report.reminders_sent, 1);
        assert_eq!(report.failures, 0);
        let notifications = db.list_notifications().unwrap();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].category, NotificationCategory::Reminder);
        assert_eq!(notifications[0].reminder_id.as_deref(), Some("r1"));
        assert_eq!(notifications[0].task_id.as_deref(), Some("t1"));
        assert_eq!(
            db.get_reminder("r1").unwrap().unwrap().status,
            ReminderStatus::Sent
        );
    }

    #[test]
    fn second_tick_produces_no_duplicate() {
        let db = setup_db();
        let now = now_ms();
        db.create_task("t1", "Write report", TaskStatus::Pending, None)
            .unwrap();
        db.create_reminder("r1", "t1", now - 1_000, NotificationType::InApp)
            .unwrap();

        run_tick(&db, FETCH_LIMIT, now);
        let second = run_tick(&db, FETCH_LIMIT, now + 1_000);

        // The reminder is sent, so the second fetch excludes it entirely.
        assert_eq!(second.reminders_sent, 0);
        assert_eq!(second.duplicates_skipped, 0);
        assert_eq!(db.list_notifications().unwrap().len(), 1);
        assert_eq!(
            db.get_reminder("r1").unwrap().unwrap().status,
            ReminderStatus::Sent
        );
    }

    #[test]
    fn future_reminder_is_left_alone() {
        let db = setup_db();
        let now = now_ms();
        db.create_task("t1", "Later", TaskStatus::Pending, None)
            .unwrap();
        db.create_reminder("r1", "t1", now + HOUR_MS, NotificationType::Email)
            .unwrap();

        let report = run_tick(&db, FETCH_LIMIT, now);

        assert_eq!(report.persisted(), 0);
        assert!(db.list_notifications().unwrap().is_empty());
        assert_eq!(
            db.get_reminder("r1").unwrap().unwrap().status,
            ReminderStatus::Pending
        );
    }

    #[test]
    fn reminders_persist_in_reminder_time_order() {
        let db = setup_db();
        let now = now_ms();
        db.create_task("t1", "Ordered", TaskStatus::Pending, None)
            .unwrap();
        // Created out of order on purpose.
        db.create_reminder("r2", "t1", now - 2_000, NotificationType::InApp)
            .unwrap();
        db.create_reminder("r3", "t1", now - 1_000, NotificationType::InApp)
            .unwrap();
        db.create_reminder("r1", "t1", now - 3_000, NotificationType::InApp)
            .unwrap();

        let report = run_tick(&db, FETCH_LIMIT, now);
        assert_eq!(report.reminders_sent, 3);

        // list_notifications is newest-first; insertion order is its reverse.
        let mut inserted: Vec<String> = db
            .list_notifications()
            .unwrap()
            .into_iter()
            .map(|n| n.reminder_id.unwrap())
            .collect();
        inserted.reverse();
        assert_eq!(inserted, vec!["r1", "r2", "r3"]);
    }

    #[test]
    fn fetch_limit_caps_work_per_tick() {
        let db = setup_db();
        let now = now_ms();
        db.create_task("t1", "Busy", TaskStatus::Pending, None)
            .unwrap();
        for i in 0..5i64 {
            db.create_reminder(
                &format!("r{}", i),
                "t1",
                now - 1_000 - i,
                NotificationType::InApp,
            )
            .unwrap();
        }

        let report = run_tick(&db, 2, now);
        assert_eq!(report.reminders_sent, 2);

        // The rest are picked up by later ticks.
        let report = run_tick(&db, FETCH_LIMIT, now);
        assert_eq!(report.reminders_sent, 3);
        assert_eq!(db.list_notifications().unwrap().len(), 5);
    }
}

mod deadline_tests {
    use super::*;

    #[test]
    fn crossed_estimate_produces_one_notification() {
        let db = setup_db();
        let now = now_ms();
        db.create_task("t1", "Deep work", TaskStatus::Pending, Some(1.0))
            .unwrap();
        db.set_task_status_at("t1", TaskStatus::InProgress, now - 2 * HOUR_MS)
            .unwrap();

        let report = run_tick(&db, FETCH_LIMIT, now);

        assert_eq!(report.estimates_reached, 1);
        let notifications = db.list_notifications().unwrap();
        assert_eq!(notifications.len(), 1);
        assert_eq!(
            notifications[0].category,
            NotificationCategory::EstimatedTime
        );
        assert_eq!(notifications[0].task_id.as_deref(), Some("t1"));
        assert!(notifications[0].reminder_id.is_none());
    }

    #[test]
    fn repeated_ticks_never_duplicate_estimate_notification() {
        let db = setup_db();
        let now = now_ms();
        db.create_task("t1", "Deep work", TaskStatus::Pending, Some(1.0))
            .unwrap();
        db.set_task_status_at("t1", TaskStatus::InProgress, now - 2 * HOUR_MS)
            .unwrap();

        run_tick(&db, FETCH_LIMIT, now);
        for i in 1..=4 {
            let report = run_tick(&db, FETCH_LIMIT, now + i * 1_000);
            assert_eq!(report.estimates_reached, 0);
            assert_eq!(report.duplicates_skipped, 1);
        }

        assert_eq!(db.list_notifications().unwrap().len(), 1);
    }

    #[test]
    fn leaving_in_progress_stops_evaluation() {
        let db = setup_db();
        let now = now_ms();
        db.create_task("t1", "Deep work", TaskStatus::Pending, Some(1.0))
            .unwrap();
        db.set_task_status_at("t1", TaskStatus::InProgress, now - 2 * HOUR_MS)
            .unwrap();
        run_tick(&db, FETCH_LIMIT, now);

        db.set_task_status("t1", TaskStatus::Completed).unwrap();
        let report = run_tick(&db, FETCH_LIMIT, now + 1_000);

        assert_eq!(report.estimates_reached, 0);
        assert_eq!(report.duplicates_skipped, 0);
        assert_eq!(db.list_notifications().unwrap().len(), 1);
    }

    #[test]
    fn re_entering_in_progress_re_arms_the_limit() {
        let db = setup_db();
        let now = now_ms();
        db.create_task("t1", "Deep work", TaskStatus::Pending, Some(1.0))
            .unwrap();
        db.set_task_status_at("t1", TaskStatus::InProgress, now - 2 * HOUR_MS)
            .unwrap();
        run_tick(&db, FETCH_LIMIT, now);
        assert_eq!(db.list_notifications().unwrap().len(), 1);

        // Pause, then restart the task with a backdated transition so the
        // estimate is crossed again in its new run.
        db.set_task_status("t1", TaskStatus::Pending).unwrap();
        let later = now + 10 * HOUR_MS;
        db.set_task_status_at("t1", TaskStatus::InProgress, later - 2 * HOUR_MS)
            .unwrap();

        let report = run_tick(&db, FETCH_LIMIT, later);

        assert_eq!(report.estimates_reached, 1);
        assert_eq!(db.list_notifications().unwrap().len(), 2);
    }

    #[test]
    fn task_without_estimate_is_ignored() {
        let db = setup_db();
        let now = now_ms();
        db.create_task("t1", "Open ended", TaskStatus::Pending, None)
            .unwrap();
        db.set_task_status_at("t1", TaskStatus::InProgress, now - 10 * HOUR_MS)
            .unwrap();

        let report = run_tick(&db, FETCH_LIMIT, now);
        assert_eq!(report.persisted(), 0);
    }
}

mod recovery_tests {
    use super::*;

    #[test]
    fn crash_between_insert_and_mark_recovers_without_duplicate() {
        let db = setup_db();
        let now = now_ms();
        db.create_task("t1", "Fragile", TaskStatus::Pending, None)
            .unwrap();
        db.create_reminder("r1", "t1", now - 1_000, NotificationType::InApp)
            .unwrap();

        // Simulate a crash after the insert but before mark_reminder_sent:
        // the notification exists, the reminder is still pending.
        db.insert_notification(&NotificationIntent {
            category: NotificationCategory::Reminder,
            task_id: "t1".to_string(),
            reminder_id: Some("r1".to_string()),
            notification_type: NotificationType::InApp,
            title: "Reminder: Fragile".to_string(),
            message: "Time to work on: Fragile (in_app reminder)".to_string(),
            in_progress_since: None,
        })
        .unwrap();
        assert_eq!(
            db.get_reminder("r1").unwrap().unwrap().status,
            ReminderStatus::Pending
        );

        let report = run_tick(&db, FETCH_LIMIT, now);

        assert_eq!(report.reminders_sent, 0);
        assert_eq!(report.duplicates_skipped, 1);
        assert_eq!(db.list_notifications().unwrap().len(), 1);
        assert_eq!(
            db.get_reminder("r1").unwrap().unwrap().status,
            ReminderStatus::Sent
        );
    }

    #[test]
    fn missing_notification_relation_defers_without_losing_reminders() {
        let db = setup_db();
        let now = now_ms();
        db.create_task("t1", "Deferred", TaskStatus::Pending, None)
            .unwrap();
        db.create_reminder("r1", "t1", now - 1_000, NotificationType::InApp)
            .unwrap();

        db.with_conn(|conn| {
            conn.execute_batch("DROP TABLE notifications")?;
            Ok(())
        })
        .unwrap();

        let report = run_tick(&db, FETCH_LIMIT, now);

        assert!(report.store_unavailable);
        assert_eq!(report.persisted(), 0);
        assert_eq!(
            db.get_reminder("r1").unwrap().unwrap().status,
            ReminderStatus::Pending
        );

        // Relation comes back; the deferred notification is produced.
        db.with_conn(|conn| {
            conn.execute_batch(
                "CREATE TABLE notifications (
                     id INTEGER PRIMARY KEY AUTOINCREMENT,
                     task_id TEXT REFERENCES tasks(id) ON DELETE SET NULL,
                     reminder_id TEXT REFERENCES reminders(id) ON DELETE SET NULL,
                     notification_type TEXT NOT NULL DEFAULT 'in_app',
                     title TEXT NOT NULL,
                     message TEXT NOT NULL,
                     notification_category TEXT NOT NULL,
                     is_read INTEGER NOT NULL DEFAULT 0,
                     created_at INTEGER NOT NULL
                 )",
            )?;
            Ok(())
        })
        .unwrap();

        let report = run_tick(&db, FETCH_LIMIT, now + 1_000);

        assert!(!report.store_unavailable);
        assert_eq!(report.reminders_sent, 1);
        assert_eq!(db.list_notifications().unwrap().len(), 1);
        assert_eq!(
            db.get_reminder("r1").unwrap().unwrap().status,
            ReminderStatus::Sent
        );
    }

    #[test]
    fn one_failing_insert_does_not_abort_the_remaining_items() {
        let db = setup_db();
        let now = now_ms();
        db.create_task("t1", "First", TaskStatus::Pending, None)
            .unwrap();
        db.create_task("t_bad", "Cursed", TaskStatus::Pending, None)
            .unwrap();
        db.create_task("t3", "Third", TaskStatus::Pending, None)
            .unwrap();
        db.create_reminder("r1", "t1", now - 3_000, NotificationType::InApp)
            .unwrap();
        db.create_reminder("r2", "t_bad", now - 2_000, NotificationType::InApp)
            .unwrap();
        db.create_reminder("r3", "t3", now - 1_000, NotificationType::InApp)
            .unwrap();

        // Make the middle item's insert fail while the relation stays healthy.
        db.with_conn(|conn| {
            conn.execute_batch(
                "CREATE TRIGGER reject_cursed BEFORE INSERT ON notifications
                 WHEN NEW.task_id = 't_bad'
                 BEGIN SELECT RAISE(ABORT, 'boom'); END",
            )?;
            Ok(())
        })
        .unwrap();

        let report = run_tick(&db, FETCH_LIMIT, now);

        assert_eq!(report.failures, 1);
        assert_eq!(report.reminders_sent, 2);
        assert!(!report.store_unavailable);

        let notifications = db.list_notifications().unwrap();
        assert_eq!(notifications.len(), 2);
        assert!(notifications
            .iter()
            .all(|n| n.task_id.as_deref() != Some("t_bad")));
        assert_eq!(
            db.get_reminder("r1").unwrap().unwrap().status,
            ReminderStatus::Sent
        );
        assert_eq!(
            db.get_reminder("r3").unwrap().unwrap().status,
            ReminderStatus::Sent
        );
        // The failed item is untouched, so the next tick retries it.
        assert_eq!(
            db.get_reminder("r2").unwrap().unwrap().status,
            ReminderStatus::Pending
        );

        db.with_conn(|conn| {
            conn.execute_batch("DROP TRIGGER reject_cursed")?;
            Ok(())
        })
        .unwrap();

        let report = run_tick(&db, FETCH_LIMIT, now + 1_000);
        assert_eq!(report.reminders_sent, 1);
        assert_eq!(db.list_notifications().unwrap().len(), 3);
        assert_eq!(
            db.get_reminder("r2").unwrap().unwrap().status,
            ReminderStatus::Sent
        );
    }

    #[test]
    fn task_deletion_cascades_reminders_and_nulls_notification_refs() {
        let db = setup_db();
        let now = now_ms();
        db.create_task("t1", "Doomed", TaskStatus::Pending, None)
            .unwrap();
        db.create_reminder("r1", "t1", now - 1_000, NotificationType::InApp)
            .unwrap();
        run_tick(&db, FETCH_LIMIT, now);

        assert!(db.delete_task("t1").unwrap());

        assert!(db.get_reminder("r1").unwrap().is_none());
        let notifications = db.list_notifications().unwrap();
        assert_eq!(notifications.len(), 1);
        assert!(notifications[0].task_id.is_none());
        assert!(notifications[0].reminder_id.is_none());
    }
}

mod scenario_tests {
    use super::*;

    /// Combined scenario: a due reminder and a crossed estimate handled in
    /// the same tick at a fixed instant.
    #[test]
    fn reminder_and_estimate_crossing_in_one_tick() {
        let db = setup_db();
        let now = ts("2024-01-01T09:05:00Z");

        db.create_task("T1", "Morning review", TaskStatus::Pending, None)
            .unwrap();
        db.create_reminder("R1", "T1", ts("2024-01-01T09:00:00Z"), NotificationType::InApp)
            .unwrap();

        db.create_task("T2", "Quick fix", TaskStatus::Pending, Some(0.5))
            .unwrap();
        db.set_task_status_at("T2", TaskStatus::InProgress, now - HOUR_MS)
            .unwrap();

        let report = run_tick(&db, FETCH_LIMIT, now);

        assert_eq!(report.reminders_sent, 1);
        assert_eq!(report.estimates_reached, 1);

        let notifications = db.list_notifications().unwrap();
        assert_eq!(notifications.len(), 2);

        let reminder_notif = notifications
            .iter()
            .find(|n| n.category == NotificationCategory::Reminder)
            .expect("reminder notification");
        assert_eq!(reminder_notif.task_id.as_deref(), Some("T1"));
        assert_eq!(reminder_notif.reminder_id.as_deref(), Some("R1"));

        let estimate_notif = notifications
            .iter()
            .find(|n| n.category == NotificationCategory::EstimatedTime)
            .expect("estimate notification");
        assert_eq!(estimate_notif.task_id.as_deref(), Some("T2"));
        assert!(estimate_notif.reminder_id.is_none());

        assert_eq!(
            db.get_reminder("R1").unwrap().unwrap().status,
            ReminderStatus::Sent
        );
    }
}
