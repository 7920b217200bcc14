use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgExecutor;

use crate::common::{ClassId, CreditId, StudentId};

/// Teacher-cancellation credits expire this many days after the grant.
pub const TEACHER_CANCELLATION_EXPIRY_DAYS: i64 = 45;

/// A single-use makeup/bonus class credit. One unit each; consumed at most
/// once, only before expiry.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Credit {
    pub id: CreditId,
    pub student_id: StudentId,
    pub credit_type: CreditType,
    pub expires_at: DateTime<Utc>,
    pub consumed_at: Option<DateTime<Utc>>,
    pub consuming_class_id: Option<ClassId>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "credit_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CreditType {
    TeacherCancellation,
    Bonus,
    LateStudent,
}

impl CreditType {
    /// Only teacher-cancellation credits fund further reschedules; bonus and
    /// late-student credits are single-shot grants.
    pub fn is_reschedulable(self) -> bool {
        matches!(self, CreditType::TeacherCancellation)
    }
}

impl Credit {
    /// Grant one teacher-cancellation credit with the standard 45-day expiry.
    pub async fn grant_teacher_cancellation<'e>(
        student_id: StudentId,
        now: DateTime<Utc>,
        executor: impl PgExecutor<'e>,
    ) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO credits (id, student_id, credit_type, expires_at)
            VALUES ($1, $2, 'teacher_cancellation', $3)
            RETURNING *
            "#,
        )
        .bind(CreditId::new())
        .bind(student_id)
        .bind(now + Duration::days(TEACHER_CANCELLATION_EXPIRY_DAYS))
        .fetch_one(executor)
        .await
        .map_err(Into::into)
    }

    /// The earliest-expiring unexpired, unconsumed credit of the given type.
    pub async fn find_usable<'e>(
        student_id: StudentId,
        credit_type: CreditType,
        now: DateTime<Utc>,
        executor: impl PgExecutor<'e>,
    ) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM credits
            WHERE student_id = $1
              AND credit_type = $2
              AND consumed_at IS NULL
              AND expires_at > $3
            ORDER BY expires_at
            LIMIT 1
            "#,
        )
        .bind(student_id)
        .bind(credit_type)
        .bind(now)
        .fetch_optional(executor)
        .await
        .map_err(Into::into)
    }

    /// Mark a credit consumed by a class. Idempotent: a second call is a
    /// no-op, which is what the at-least-once post-commit step relies on.
    pub async fn mark_consumed<'e>(
        id: CreditId,
        consuming_class_id: ClassId,
        executor: impl PgExecutor<'e>,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE credits
            SET consumed_at = now(), consuming_class_id = $2
            WHERE id = $1 AND consumed_at IS NULL
            "#,
        )
        .bind(id)
        .bind(consuming_class_id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn find_for_student<'e>(
        student_id: StudentId,
        executor: impl PgExecutor<'e>,
    ) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM credits WHERE student_id = $1 ORDER BY expires_at",
        )
        .bind(student_id)
        .fetch_all(executor)
        .await
        .map_err(Into::into)
    }
}
