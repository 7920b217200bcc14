use anyhow::Result;
use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgExecutor;
use typed_builder::TypedBuilder;

use crate::common::{SlotId, TeacherId};

/// A teacher-declared open time window.
///
/// Three recurrence modes:
/// - **one_off**: applies only on `effective_from`
/// - **weekly**: every week on `day_of_week`, optionally until `recurrence_until`
/// - **biweekly**: every other week, anchored on `effective_from`
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AvailabilitySlot {
    pub id: SlotId,
    pub teacher_id: TeacherId,
    pub day_of_week: i32,
    pub starts_at: NaiveTime,
    pub ends_at: NaiveTime,
    pub kind: SlotKind,
    pub recurrence: RecurrenceKind,
    pub effective_from: NaiveDate,
    pub recurrence_until: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "slot_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SlotKind {
    Regular,
    Makeup,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "recurrence_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RecurrenceKind {
    OneOff,
    Weekly,
    Biweekly,
}

#[derive(Debug, Clone, TypedBuilder)]
pub struct NewSlot {
    pub teacher_id: TeacherId,
    pub day_of_week: i32,
    pub starts_at: NaiveTime,
    pub ends_at: NaiveTime,
    #[builder(default = SlotKind::Regular)]
    pub kind: SlotKind,
    #[builder(default = RecurrenceKind::Weekly)]
    pub recurrence: RecurrenceKind,
    pub effective_from: NaiveDate,
    #[builder(default)]
    pub recurrence_until: Option<NaiveDate>,
}

impl AvailabilitySlot {
    /// Whether this slot has an occurrence on `date`.
    pub fn occurs_on(&self, date: NaiveDate) -> bool {
        if date < self.effective_from {
            return false;
        }
        match self.recurrence {
            RecurrenceKind::OneOff => date == self.effective_from,
            RecurrenceKind::Weekly | RecurrenceKind::Biweekly => {
                if date.weekday().num_days_from_sunday() as i32 != self.day_of_week {
                    return false;
                }
                if let Some(until) = self.recurrence_until {
                    if date > until {
                        return false;
                    }
                }
                match self.recurrence {
                    RecurrenceKind::Biweekly => {
                        let weeks = (date - self.effective_from).num_days() / 7;
                        weeks % 2 == 0
                    }
                    _ => true,
                }
            }
        }
    }

    /// Insert a slot after checking the no-overlap invariant for the teacher
    /// on the same weekday. Windows are half-open, `[starts_at, ends_at)`:
    /// back-to-back slots sharing a boundary do not overlap. Must run inside
    /// the caller's transaction so the overlap read and the insert commit
    /// together.
    pub async fn insert_checked(
        new: &NewSlot,
        conn: &mut sqlx::PgConnection,
    ) -> Result<Option<Self>> {
        let conflicting: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM availability_slots
            WHERE teacher_id = $1
              AND day_of_week = $2
              AND starts_at < $4
              AND ends_at > $3
            "#,
        )
        .bind(new.teacher_id)
        .bind(new.day_of_week)
        .bind(new.starts_at)
        .bind(new.ends_at)
        .fetch_one(&mut *conn)
        .await?;

        if conflicting > 0 {
            return Ok(None);
        }

        let slot = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO availability_slots (
                id, teacher_id, day_of_week, starts_at, ends_at,
                kind, recurrence, effective_from, recurrence_until
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(SlotId::new())
        .bind(new.teacher_id)
        .bind(new.day_of_week)
        .bind(new.starts_at)
        .bind(new.ends_at)
        .bind(new.kind)
        .bind(new.recurrence)
        .bind(new.effective_from)
        .bind(new.recurrence_until)
        .fetch_one(&mut *conn)
        .await?;

        Ok(Some(slot))
    }

    pub async fn find_by_id<'e>(id: SlotId, executor: impl PgExecutor<'e>) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM availability_slots WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await
            .map_err(Into::into)
    }

    pub async fn find_for_teacher<'e>(
        teacher_id: TeacherId,
        executor: impl PgExecutor<'e>,
    ) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM availability_slots
             WHERE teacher_id = $1
             ORDER BY day_of_week, starts_at",
        )
        .bind(teacher_id)
        .fetch_all(executor)
        .await
        .map_err(Into::into)
    }

    pub async fn delete<'e>(id: SlotId, executor: impl PgExecutor<'e>) -> Result<bool> {
        let result = sqlx::query("DELETE FROM availability_slots WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
