//! Reminder & Notification Scheduler
//!
//! Background process that periodically scans task-management state, decides
//! when a reminder or a time-estimate deadline has been crossed, and emits
//! exactly one durable notification per triggering event. Safe to run
//! repeatedly and safe to restart: the persisted notification rows and
//! reminder statuses are the only memory of what already fired.

pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod scheduler;
pub mod types;
