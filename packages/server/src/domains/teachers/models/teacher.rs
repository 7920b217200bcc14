use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgExecutor;

use crate::common::TeacherId;

/// Teacher profile as the engine sees it: per-teacher scheduling policy
/// knobs and the vacation-day balance.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Teacher {
    pub id: TeacherId,
    pub display_name: String,
    pub booking_lead_time_hours: i32,
    pub booking_horizon_days: i32,
    pub cancellation_policy_hours: i32,
    pub vacation_days_remaining: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Teacher {
    pub async fn find_by_id<'e>(
        id: TeacherId,
        executor: impl PgExecutor<'e>,
    ) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM teachers WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await
            .map_err(Into::into)
    }

    /// Adjust the vacation-day balance by `delta`, returning the new balance.
    pub async fn adjust_vacation_balance<'e>(
        id: TeacherId,
        delta: i32,
        executor: impl PgExecutor<'e>,
    ) -> Result<i32> {
        sqlx::query_scalar(
            r#"
            UPDATE teachers
            SET vacation_days_remaining = vacation_days_remaining + $2, updated_at = now()
            WHERE id = $1
            RETURNING vacation_days_remaining
            "#,
        )
        .bind(id)
        .bind(delta)
        .fetch_one(executor)
        .await
        .map_err(Into::into)
    }
}
