use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgExecutor;

use crate::common::{TeacherId, VacationId};

/// A teacher vacation. Creation displaces every scheduled class in its range
/// and debits the teacher's day balance; deletion reverses both.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Vacation {
    pub id: VacationId,
    pub teacher_id: TeacherId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Vacation {
    pub async fn insert<'e>(
        id: VacationId,
        teacher_id: TeacherId,
        start_date: NaiveDate,
        end_date: NaiveDate,
        reason: Option<&str>,
        executor: impl PgExecutor<'e>,
    ) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO vacations (id, teacher_id, start_date, end_date, reason)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(teacher_id)
        .bind(start_date)
        .bind(end_date)
        .bind(reason)
        .fetch_one(executor)
        .await
        .map_err(Into::into)
    }

    pub async fn find_by_id<'e>(
        id: VacationId,
        executor: impl PgExecutor<'e>,
    ) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM vacations WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await
            .map_err(Into::into)
    }

    pub async fn delete<'e>(id: VacationId, executor: impl PgExecutor<'e>) -> Result<bool> {
        let result = sqlx::query("DELETE FROM vacations WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn find_for_teacher<'e>(
        teacher_id: TeacherId,
        executor: impl PgExecutor<'e>,
    ) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM vacations WHERE teacher_id = $1 ORDER BY start_date",
        )
        .bind(teacher_id)
        .fetch_all(executor)
        .await
        .map_err(Into::into)
    }
}
