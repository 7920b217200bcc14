use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgExecutor;
use sqlx::types::Json;
use std::collections::HashMap;
use uuid::Uuid;

use crate::common::StudentId;

/// Student profile as the engine sees it: contract metadata, the class
/// credit balance bookings draw down, the per-month reschedule counters and
/// the teacher-roster index maintained by template updates.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Student {
    pub id: StudentId,
    pub display_name: String,
    pub contract_start: Option<NaiveDate>,
    pub contract_months: Option<i32>,
    pub class_credit_balance: i32,
    pub monthly_reschedules: Json<HashMap<String, i32>>,
    pub teacher_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Student {
    pub async fn find_by_id<'e>(
        id: StudentId,
        executor: impl PgExecutor<'e>,
    ) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM students WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await
            .map_err(Into::into)
    }

    /// Reschedule count for a month key ("YYYY-MM").
    pub fn reschedules_in(&self, month_key: &str) -> i32 {
        self.monthly_reschedules
            .get(month_key)
            .copied()
            .unwrap_or(0)
    }

    /// Adjust the class credit balance by `delta` and return the new balance.
    pub async fn adjust_credit_balance<'e>(
        id: StudentId,
        delta: i32,
        executor: impl PgExecutor<'e>,
    ) -> Result<i32> {
        sqlx::query_scalar(
            r#"
            UPDATE students
            SET class_credit_balance = class_credit_balance + $2, updated_at = now()
            WHERE id = $1
            RETURNING class_credit_balance
            "#,
        )
        .bind(id)
        .bind(delta)
        .fetch_one(executor)
        .await
        .map_err(Into::into)
    }

    /// Bump the reschedule counter for a month key.
    pub async fn increment_monthly_reschedules<'e>(
        id: StudentId,
        month_key: &str,
        executor: impl PgExecutor<'e>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE students
            SET monthly_reschedules = jsonb_set(
                    monthly_reschedules,
                    ARRAY[$2],
                    to_jsonb(COALESCE((monthly_reschedules ->> $2)::int, 0) + 1)
                ),
                updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(month_key)
        .execute(executor)
        .await?;
        Ok(())
    }

    /// Replace the teacher-roster index (the set of teachers the student's
    /// current schedule references).
    pub async fn set_teacher_roster<'e>(
        id: StudentId,
        teacher_ids: &[Uuid],
        executor: impl PgExecutor<'e>,
    ) -> Result<()> {
        sqlx::query("UPDATE students SET teacher_ids = $2, updated_at = now() WHERE id = $1")
            .bind(id)
            .bind(teacher_ids)
            .execute(executor)
            .await?;
        Ok(())
    }
}
