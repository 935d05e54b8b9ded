//! Scheduler for cogflow cron triggers.
//!
//! This crate provides:
//!
//! - **CronSchedule**: 5-field cron parsing and next-fire evaluation
//! - **CronRunner**: the polling loop that fires due cron triggers
//!   through the engine

pub mod error;
pub mod runner;
pub mod schedule;

pub use error::ScheduleError;
pub use runner::CronRunner;
pub use schedule::CronSchedule;
