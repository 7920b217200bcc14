use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domains::classes::ClassStatus;

/// Typed failures for every scheduling engine workflow.
///
/// Nothing throws past the engine boundary as an unstructured error: every
/// entry point returns the mutated record or one of these. Side-effect
/// (notification/achievement) failures never appear here; they are logged
/// and swallowed by the effects layer.
#[derive(Debug, Error)]
pub enum SchedulingError {
    #[error("invalid request: {0}")]
    Validation(String),

    #[error("{entity} not found")]
    NotFound { entity: &'static str },

    #[error("student has no remaining class credits")]
    InsufficientCredits,

    #[error("teacher already has a class at {0}")]
    SlotAlreadyBooked(DateTime<Utc>),

    #[error("classes must be booked at least {0} hours in advance")]
    LeadTimeViolation(i32),

    #[error("classes may be booked at most {0} days ahead")]
    HorizonViolation(i32),

    #[error("availability slot overlaps an existing slot for this teacher")]
    SlotOverlap,

    #[error("monthly reschedule limit of {0} reached")]
    MonthlyQuotaExceeded(i32),

    #[error("no unexpired teacher-cancellation credit available")]
    MakeupCreditRequired,

    #[error("class cannot be rescheduled")]
    NotReschedulable,

    #[error("class status {from:?} does not allow transition to {to:?}")]
    InvalidStatusTransition { from: ClassStatus, to: ClassStatus },

    #[error("student already has scheduled classes; edit the schedule instead of regenerating")]
    TemplateRegenerationBlocked,

    #[error("vacations require at least {0} days notice")]
    VacationLeadTime(i64),

    #[error("vacations may not exceed {0} days")]
    VacationTooLong(i64),

    #[error("vacation exceeds remaining balance of {0} days")]
    VacationBalanceExceeded(i32),

    #[error("operation conflicted with concurrent updates, retries exhausted")]
    Conflict,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}
