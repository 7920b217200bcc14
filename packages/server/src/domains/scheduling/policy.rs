//! Pure booking-policy checks.
//!
//! Every rule that only needs timestamps and counters lives here so the
//! workflows stay thin and the rules stay unit-testable without a database.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};

use super::error::SchedulingError;

/// At most this many regular (non-makeup) reschedules per calendar month.
pub const MONTHLY_RESCHEDULE_LIMIT: i32 = 2;

/// Vacations must be filed at least this many days before they start.
pub const VACATION_MIN_LEAD_DAYS: i64 = 40;

/// Vacations may not exceed this many days.
pub const VACATION_MAX_DAYS: i64 = 14;

/// A class time must be at least `lead_time_hours` in the future.
pub fn check_lead_time(
    now: DateTime<Utc>,
    scheduled_at: DateTime<Utc>,
    lead_time_hours: i32,
) -> Result<(), SchedulingError> {
    if scheduled_at - now < Duration::hours(lead_time_hours as i64) {
        return Err(SchedulingError::LeadTimeViolation(lead_time_hours));
    }
    Ok(())
}

/// A class time may be at most `horizon_days` from now.
pub fn check_horizon(
    now: DateTime<Utc>,
    scheduled_at: DateTime<Utc>,
    horizon_days: i32,
) -> Result<(), SchedulingError> {
    if scheduled_at - now > Duration::days(horizon_days as i64) {
        return Err(SchedulingError::HorizonViolation(horizon_days));
    }
    Ok(())
}

/// A student cancellation inside the policy window is "late": the slot stays
/// forfeited for that date instead of being freed.
pub fn is_late_cancellation(
    now: DateTime<Utc>,
    scheduled_at: DateTime<Utc>,
    policy_hours: i32,
) -> bool {
    scheduled_at - now <= Duration::hours(policy_hours as i64)
}

/// Month key for the per-student reschedule counter, e.g. "2026-08".
pub fn month_key(at: DateTime<Utc>) -> String {
    format!("{:04}-{:02}", at.year(), at.month())
}

/// Enforce the monthly reschedule quota against the current count.
pub fn check_monthly_quota(current_count: i32) -> Result<(), SchedulingError> {
    if current_count >= MONTHLY_RESCHEDULE_LIMIT {
        return Err(SchedulingError::MonthlyQuotaExceeded(
            MONTHLY_RESCHEDULE_LIMIT,
        ));
    }
    Ok(())
}

/// Vacation rules: lead time relative to `start_date`, maximum length, both
/// inclusive of the end date.
pub fn check_vacation_window(
    today: NaiveDate,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<i64, SchedulingError> {
    if end_date < start_date {
        return Err(SchedulingError::Validation(
            "vacation end date precedes start date".into(),
        ));
    }
    if (start_date - today).num_days() < VACATION_MIN_LEAD_DAYS {
        return Err(SchedulingError::VacationLeadTime(VACATION_MIN_LEAD_DAYS));
    }
    let days = (end_date - start_date).num_days() + 1;
    if days > VACATION_MAX_DAYS {
        return Err(SchedulingError::VacationTooLong(VACATION_MAX_DAYS));
    }
    Ok(days)
}

/// Deleting a vacation needs the same notice, measured against the
/// vacation's own start.
pub fn check_vacation_delete_lead(
    today: NaiveDate,
    start_date: NaiveDate,
) -> Result<(), SchedulingError> {
    if (start_date - today).num_days() < VACATION_MIN_LEAD_DAYS {
        return Err(SchedulingError::VacationLeadTime(VACATION_MIN_LEAD_DAYS));
    }
    Ok(())
}
