use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgExecutor;
use typed_builder::TypedBuilder;
use uuid::Uuid;

use crate::common::{ClassId, CreditId, SlotId, StudentId, TeacherId, VacationId};
use crate::domains::credits::CreditType;

use super::status::{CancelActor, ClassStatus, ClassType};

/// The canonical booking record. Created by booking or template expansion,
/// mutated only through the scheduling engine.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct StudentClass {
    pub id: ClassId,
    pub student_id: StudentId,
    pub teacher_id: Option<TeacherId>,
    pub scheduled_at: DateTime<Utc>,
    pub duration_minutes: i32,
    pub status: ClassStatus,
    pub class_type: ClassType,
    pub topic: Option<String>,
    pub credit_id: Option<CreditId>,
    pub credit_type: Option<CreditType>,
    pub reschedulable: bool,
    pub rescheduled_from: Option<ClassId>,
    pub availability_slot_id: Option<SlotId>,
    pub vacation_id: Option<VacationId>,
    pub canceled_by: Option<Uuid>,
    pub cancel_actor: Option<CancelActor>,
    pub cancel_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Creation parameter struct
// =============================================================================

#[derive(Debug, Clone, TypedBuilder)]
pub struct NewClass {
    pub student_id: StudentId,
    #[builder(default)]
    pub teacher_id: Option<TeacherId>,
    pub scheduled_at: DateTime<Utc>,
    #[builder(default = 60)]
    pub duration_minutes: i32,
    #[builder(default = ClassType::Regular)]
    pub class_type: ClassType,
    #[builder(default)]
    pub topic: Option<String>,
    #[builder(default)]
    pub credit_id: Option<CreditId>,
    #[builder(default)]
    pub credit_type: Option<CreditType>,
    #[builder(default = true)]
    pub reschedulable: bool,
    #[builder(default)]
    pub rescheduled_from: Option<ClassId>,
    #[builder(default)]
    pub availability_slot_id: Option<SlotId>,
}

impl StudentClass {
    pub async fn insert<'e>(new: &NewClass, executor: impl PgExecutor<'e>) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO classes (
                id, student_id, teacher_id, scheduled_at, duration_minutes,
                status, class_type, topic, credit_id, credit_type,
                reschedulable, rescheduled_from, availability_slot_id
            )
            VALUES ($1, $2, $3, $4, $5, 'scheduled', $6, $7, $8, $9, $10, $11, $12)
            RETURNING *
            "#,
        )
        .bind(ClassId::new())
        .bind(new.student_id)
        .bind(new.teacher_id)
        .bind(new.scheduled_at)
        .bind(new.duration_minutes)
        .bind(new.class_type)
        .bind(new.topic.as_deref())
        .bind(new.credit_id)
        .bind(new.credit_type)
        .bind(new.reschedulable)
        .bind(new.rescheduled_from)
        .bind(new.availability_slot_id)
        .fetch_one(executor)
        .await
        .map_err(Into::into)
    }

    pub async fn find_by_id<'e>(id: ClassId, executor: impl PgExecutor<'e>) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM classes WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await
            .map_err(Into::into)
    }

    /// The booking-conflict read: a live class for this teacher whose
    /// time range overlaps [at, at + duration).
    pub async fn find_scheduled_for_teacher_at<'e>(
        teacher_id: TeacherId,
        at: DateTime<Utc>,
        duration_minutes: i32,
        executor: impl PgExecutor<'e>,
    ) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM classes
            WHERE teacher_id = $1
              AND status = 'scheduled'
              AND scheduled_at < $2 + make_interval(mins => $3)
              AND scheduled_at + make_interval(mins => duration_minutes) > $2
            LIMIT 1
            "#,
        )
        .bind(teacher_id)
        .bind(at)
        .bind(duration_minutes)
        .fetch_optional(executor)
        .await
        .map_err(Into::into)
    }

    pub async fn has_future_scheduled_for_student<'e>(
        student_id: StudentId,
        now: DateTime<Utc>,
        executor: impl PgExecutor<'e>,
    ) -> Result<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM classes
             WHERE student_id = $1 AND status = 'scheduled' AND scheduled_at > $2",
        )
        .bind(student_id)
        .bind(now)
        .fetch_one(executor)
        .await?;
        Ok(count > 0)
    }

    pub async fn set_status<'e>(
        id: ClassId,
        status: ClassStatus,
        executor: impl PgExecutor<'e>,
    ) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            "UPDATE classes SET status = $2, updated_at = now() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status)
        .fetch_one(executor)
        .await
        .map_err(Into::into)
    }

    pub async fn set_canceled<'e>(
        id: ClassId,
        status: ClassStatus,
        actor: CancelActor,
        canceled_by: Uuid,
        reason: Option<&str>,
        executor: impl PgExecutor<'e>,
    ) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            r#"
            UPDATE classes
            SET status = $2, cancel_actor = $3, canceled_by = $4,
                cancel_reason = $5, updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(actor)
        .bind(canceled_by)
        .bind(reason)
        .fetch_one(executor)
        .await
        .map_err(Into::into)
    }

    /// Flip every live class for the teacher inside the window to
    /// `teacher_vacation`, tagged with the vacation that displaced them.
    pub async fn apply_vacation<'e>(
        teacher_id: TeacherId,
        vacation_id: VacationId,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
        executor: impl PgExecutor<'e>,
    ) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            r#"
            UPDATE classes
            SET status = 'teacher_vacation', vacation_id = $2, updated_at = now()
            WHERE teacher_id = $1
              AND status = 'scheduled'
              AND scheduled_at >= $3
              AND scheduled_at < $4
            RETURNING *
            "#,
        )
        .bind(teacher_id)
        .bind(vacation_id)
        .bind(window_start)
        .bind(window_end)
        .fetch_all(executor)
        .await
        .map_err(Into::into)
    }

    /// Restore exactly the classes a vacation displaced.
    pub async fn restore_vacation<'e>(
        vacation_id: VacationId,
        executor: impl PgExecutor<'e>,
    ) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            r#"
            UPDATE classes
            SET status = 'scheduled', vacation_id = NULL, updated_at = now()
            WHERE vacation_id = $1 AND status = 'teacher_vacation'
            RETURNING *
            "#,
        )
        .bind(vacation_id)
        .fetch_all(executor)
        .await
        .map_err(Into::into)
    }

    /// Delete future scheduled classes matching a removed template triple.
    /// Day-of-week and hour are evaluated in UTC, matching expansion.
    pub async fn delete_future_matching_entry<'e>(
        student_id: StudentId,
        teacher_id: TeacherId,
        day_of_week: i32,
        hour: i32,
        now: DateTime<Utc>,
        executor: impl PgExecutor<'e>,
    ) -> Result<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM classes
            WHERE student_id = $1
              AND teacher_id = $2
              AND status = 'scheduled'
              AND scheduled_at > $3
              AND EXTRACT(DOW FROM scheduled_at AT TIME ZONE 'UTC')::int = $4
              AND EXTRACT(HOUR FROM scheduled_at AT TIME ZONE 'UTC')::int = $5
            "#,
        )
        .bind(student_id)
        .bind(teacher_id)
        .bind(now)
        .bind(day_of_week)
        .bind(hour)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    /// Reassign future scheduled classes at a (day, hour) to a new teacher.
    pub async fn reassign_future_matching_entry<'e>(
        student_id: StudentId,
        day_of_week: i32,
        hour: i32,
        new_teacher_id: TeacherId,
        now: DateTime<Utc>,
        executor: impl PgExecutor<'e>,
    ) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE classes
            SET teacher_id = $4, updated_at = now()
            WHERE student_id = $1
              AND status = 'scheduled'
              AND scheduled_at > $3
              AND EXTRACT(DOW FROM scheduled_at AT TIME ZONE 'UTC')::int = $2
              AND EXTRACT(HOUR FROM scheduled_at AT TIME ZONE 'UTC')::int = $5
            "#,
        )
        .bind(student_id)
        .bind(day_of_week)
        .bind(now)
        .bind(new_teacher_id)
        .bind(hour)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    /// Migrate a terminal cancelled class into `class_history` and remove it
    /// from `classes`, so the underlying slot reads open again.
    pub async fn archive(&self, conn: &mut sqlx::PgConnection) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO class_history (
                id, student_id, teacher_id, scheduled_at, duration_minutes,
                status, class_type, topic, cancel_actor, cancel_reason
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(self.id)
        .bind(self.student_id)
        .bind(self.teacher_id)
        .bind(self.scheduled_at)
        .bind(self.duration_minutes)
        .bind(self.status)
        .bind(self.class_type)
        .bind(self.topic.as_deref())
        .bind(self.cancel_actor)
        .bind(self.cancel_reason.as_deref())
        .execute(&mut *conn)
        .await?;

        sqlx::query("DELETE FROM classes WHERE id = $1")
            .bind(self.id)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    pub async fn find_for_student<'e>(
        student_id: StudentId,
        executor: impl PgExecutor<'e>,
    ) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM classes WHERE student_id = $1 ORDER BY scheduled_at",
        )
        .bind(student_id)
        .fetch_all(executor)
        .await
        .map_err(Into::into)
    }
}
