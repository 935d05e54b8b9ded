//! Cron schedule parsing and evaluation.
//!
//! Trigger specs are the common 5-field form (minute hour day-of-month
//! month day-of-week), evaluated in UTC. The `cron` crate expects a
//! seconds field, so a zero is prepended before parsing.

use crate::error::ScheduleError;
use chrono::{DateTime, Utc};
use std::str::FromStr;

/// A parsed cron schedule.
#[derive(Debug, Clone)]
pub struct CronSchedule {
    expression: String,
    schedule: cron::Schedule,
}

impl CronSchedule {
    /// Parses a 5-field cron expression.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError::InvalidCronExpression`] if the
    /// expression does not have 5 fields or fails to parse.
    pub fn parse(expression: &str) -> Result<Self, ScheduleError> {
        let fields = expression.split_whitespace().count();
        if fields != 5 {
            return Err(ScheduleError::InvalidCronExpression {
                expression: expression.to_string(),
                reason: format!("expected 5 fields, got {fields}"),
            });
        }
        let schedule = cron::Schedule::from_str(&format!("0 {expression}")).map_err(|e| {
            ScheduleError::InvalidCronExpression {
                expression: expression.to_string(),
                reason: e.to_string(),
            }
        })?;
        Ok(Self {
            expression: expression.to_string(),
            schedule,
        })
    }

    /// Returns the original expression.
    #[must_use]
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Returns the next fire time strictly after the given instant.
    #[must_use]
    pub fn next_after(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.schedule.after(&after).next()
    }

    /// Returns true if the schedule fires in the window `(after, until]`.
    #[must_use]
    pub fn fires_between(&self, after: DateTime<Utc>, until: DateTime<Utc>) -> bool {
        self.next_after(after).is_some_and(|next| next <= until)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parse_accepts_five_fields() {
        assert!(CronSchedule::parse("0 7 * * *").is_ok());
        assert!(CronSchedule::parse("*/5 * * * *").is_ok());
    }

    #[test]
    fn parse_rejects_wrong_field_count() {
        let err = CronSchedule::parse("0 7 * *").unwrap_err();
        assert!(matches!(err, ScheduleError::InvalidCronExpression { .. }));
        assert!(CronSchedule::parse("0 0 7 * * *").is_err());
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(CronSchedule::parse("not a cron spec x").is_err());
    }

    #[test]
    fn next_after_daily_schedule() {
        let schedule = CronSchedule::parse("0 7 * * *").expect("parse");
        let after = Utc.with_ymd_and_hms(2024, 5, 1, 6, 0, 0).unwrap();
        let next = schedule.next_after(after).expect("next");
        assert_eq!(next, Utc.with_ymd_and_hms(2024, 5, 1, 7, 0, 0).unwrap());
    }

    #[test]
    fn fires_between_window() {
        let schedule = CronSchedule::parse("0 7 * * *").expect("parse");
        let morning = Utc.with_ymd_and_hms(2024, 5, 1, 6, 0, 0).unwrap();
        let later = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        let evening = Utc.with_ymd_and_hms(2024, 5, 1, 18, 0, 0).unwrap();

        assert!(schedule.fires_between(morning, later));
        assert!(!schedule.fires_between(later, evening));
    }
}
