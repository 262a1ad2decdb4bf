//! Scheduler loop: polling cadence, tick orchestration, and lifecycle.
//!
//! One long-lived background task runs the loop. It is the only writer of
//! reminder-sent transitions and notification inserts; everything it knows
//! about past ticks lives in the store, so restarting it is always safe.

pub mod deadlines;
pub mod dedup;
pub mod reminders;

use crate::config::Config;
use crate::db::{now_ms, Database};
use crate::error::Result;
use crate::types::{NotificationCategory, NotificationIntent};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Outcome of one evaluate-and-persist cycle.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TickReport {
    /// Reminder notifications persisted this tick.
    pub reminders_sent: usize,
    /// Estimated-time notifications persisted this tick.
    pub estimates_reached: usize,
    /// Intents discarded because a notification already existed.
    pub duplicates_skipped: usize,
    /// Per-item failures (deferred to the next tick, never aborting it).
    pub failures: usize,
    /// The notification relation was missing or unreachable; persistence was
    /// skipped and source records were left untouched.
    pub store_unavailable: bool,
}

impl TickReport {
    pub fn persisted(&self) -> usize {
        self.reminders_sent + self.estimates_reached
    }

    fn is_quiet(&self) -> bool {
        *self == TickReport::default()
    }
}

enum Persisted {
    Inserted,
    Duplicate,
}

/// Run one tick against the store at the given instant.
///
/// The two fetches are independent; a failure in one half is logged and the
/// other half still runs. Reminder intents are persisted first, in
/// `reminder_time` order, then deadline intents.
pub fn run_tick(db: &Database, fetch_limit: u32, now_ms: i64) -> TickReport {
    let mut report = TickReport::default();
    let mut intents: Vec<NotificationIntent> = Vec::new();

    match db.fetch_due_reminders(now_ms, fetch_limit) {
        Ok(due) => {
            if !due.is_empty() {
                info!(count = due.len(), "Found due reminder(s)");
            }
            intents.extend(reminders::evaluate(&due));
        }
        Err(e) if e.is_store_unavailable() => {
            debug!("Reminder relation not available: {}", e);
            report.store_unavailable = true;
        }
        Err(e) => {
            warn!(error = %e, "Failed to fetch due reminders");
            report.failures += 1;
        }
    }

    match db.fetch_in_progress_tasks_with_estimate(fetch_limit) {
        Ok(tasks) => intents.extend(deadlines::evaluate(&tasks, now_ms)),
        Err(e) if e.is_store_unavailable() => {
            debug!("Task relation not available: {}", e);
            report.store_unavailable = true;
        }
        Err(e) => {
            warn!(error = %e, "Failed to fetch in-progress tasks");
            report.failures += 1;
        }
    }

    for intent in &intents {
        match persist_intent(db, intent) {
            Ok(Persisted::Inserted) => {
                info!(
                    category = intent.category.as_str(),
                    task_id = %intent.task_id,
                    "Notification created"
                );
                match intent.category {
                    NotificationCategory::Reminder => report.reminders_sent += 1,
                    NotificationCategory::EstimatedTime => report.estimates_reached += 1,
                    NotificationCategory::DueDate => {}
                }
            }
            Ok(Persisted::Duplicate) => report.duplicates_skipped += 1,
            Err(e) if e.is_store_unavailable() => {
                // Nothing later in the list can succeed either. Reminders
                // stay pending and become eligible again next tick.
                debug!("Notification relation not available, deferring: {}", e);
                report.store_unavailable = true;
                break;
            }
            Err(e) => {
                warn!(
                    category = intent.category.as_str(),
                    task_id = %intent.task_id,
                    error = %e,
                    "Failed to persist notification, deferring to next tick"
                );
                report.failures += 1;
            }
        }
    }

    report
}

/// Persist one intent: dedup probe, insert, then (for reminders) mark sent.
/// Mark-sent runs strictly after the insert succeeds, so a crash between the
/// two leaves an unmarked reminder whose notification is already durable;
/// the duplicate branch below re-marks it on the next tick.
fn persist_intent(db: &Database, intent: &NotificationIntent) -> Result<Persisted> {
    if dedup::is_duplicate(db, intent)? {
        if let Some(reminder_id) = &intent.reminder_id {
            if db.mark_reminder_sent(reminder_id)? {
                debug!(reminder_id = %reminder_id, "Re-marked reminder whose notification already existed");
            }
        }
        return Ok(Persisted::Duplicate);
    }

    db.insert_notification(intent)?;

    if let Some(reminder_id) = &intent.reminder_id {
        db.mark_reminder_sent(reminder_id)?;
    }

    Ok(Persisted::Inserted)
}

/// Process-wide scheduler lifecycle: `start()` once at application startup,
/// `stop()` once at shutdown.
pub struct Scheduler {
    db: Database,
    config: Config,
    shutdown: Option<watch::Sender<bool>>,
    handle: Option<JoinHandle<()>>,
}

impl Scheduler {
    pub fn new(db: Database, config: Config) -> Self {
        Self {
            db,
            config,
            shutdown: None,
            handle: None,
        }
    }

    /// Spawn the polling loop. Refuses to start with an invalid config;
    /// a disabled scheduler or a second `start()` is a logged no-op.
    pub fn start(&mut self) -> Result<()> {
        self.config.validate()?;

        if !self.config.enabled {
            info!("Scheduler is disabled in settings");
            return Ok(());
        }
        if self.handle.is_some() {
            warn!("Scheduler is already running");
            return Ok(());
        }

        let (tx, rx) = watch::channel(false);
        let db = self.db.clone();
        let config = self.config.clone();
        self.handle = Some(tokio::spawn(run_loop(db, config, rx)));
        self.shutdown = Some(tx);

        info!(
            interval_minutes = self.config.interval_minutes,
            "Scheduler started"
        );
        Ok(())
    }

    /// Signal shutdown and wait for the loop to exit. The signal is observed
    /// only at the sleep boundary; an in-flight tick always completes.
    pub async fn stop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(true);
        }
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                warn!(error = %e, "Scheduler task ended abnormally");
            }
            info!("Scheduler stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }
}

async fn run_loop(db: Database, config: Config, mut shutdown: watch::Receiver<bool>) {
    let interval = config.interval();

    loop {
        let report = run_tick(&db, config.fetch_limit, now_ms());
        if report.is_quiet() {
            debug!("Tick complete, nothing due");
        } else {
            info!(
                reminders = report.reminders_sent,
                estimates = report.estimates_reached,
                duplicates = report.duplicates_skipped,
                failures = report.failures,
                store_unavailable = report.store_unavailable,
                "Tick complete"
            );
        }

        // Fixed cadence: a fast tick does not shorten the wait.
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = shutdown.changed() => {
                debug!("Shutdown signal received");
                break;
            }
        }
    }
}
