use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgExecutor;

use crate::common::{ExceptionId, SlotId, TeacherId};

/// Suppresses one occurrence of a recurring slot (booked or blocked).
/// Created when a booking consumes the slot's time; deleted when the
/// booking is released.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AvailabilityException {
    pub id: ExceptionId,
    pub slot_id: SlotId,
    pub teacher_id: TeacherId,
    pub occurs_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl AvailabilityException {
    pub async fn insert<'e>(
        slot_id: SlotId,
        teacher_id: TeacherId,
        occurs_at: DateTime<Utc>,
        executor: impl PgExecutor<'e>,
    ) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO availability_exceptions (id, slot_id, teacher_id, occurs_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (slot_id, occurs_at) DO UPDATE SET occurs_at = EXCLUDED.occurs_at
            RETURNING *
            "#,
        )
        .bind(ExceptionId::new())
        .bind(slot_id)
        .bind(teacher_id)
        .bind(occurs_at)
        .fetch_one(executor)
        .await
        .map_err(Into::into)
    }

    /// Release the occurrence a booking consumed.
    pub async fn delete_occurrence<'e>(
        slot_id: SlotId,
        occurs_at: DateTime<Utc>,
        executor: impl PgExecutor<'e>,
    ) -> Result<bool> {
        let result =
            sqlx::query("DELETE FROM availability_exceptions WHERE slot_id = $1 AND occurs_at = $2")
                .bind(slot_id)
                .bind(occurs_at)
                .execute(executor)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn exists_at<'e>(
        slot_id: SlotId,
        occurs_at: DateTime<Utc>,
        executor: impl PgExecutor<'e>,
    ) -> Result<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM availability_exceptions WHERE slot_id = $1 AND occurs_at = $2",
        )
        .bind(slot_id)
        .bind(occurs_at)
        .fetch_one(executor)
        .await?;
        Ok(count > 0)
    }
}
