//! Booking workflow.
//!
//! Lead-time, horizon and the slot's recurrence (the requested date must be
//! an actual occurrence) are checked up front; everything that races other
//! writers (credit balance, the exception and conflict reads, the three
//! writes) happens inside one serializable transaction.

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use typed_builder::TypedBuilder;

use crate::common::{SlotId, StudentId, TeacherId};
use crate::domains::availability::{AvailabilityException, AvailabilitySlot, SlotKind};
use crate::domains::classes::{ClassType, NewClass, StudentClass};
use crate::domains::scheduling::{policy, SchedulingError};
use crate::domains::students::Student;
use crate::domains::teachers::Teacher;
use crate::kernel::{run_serializable, ServerDeps};

#[derive(Debug, Clone, TypedBuilder)]
pub struct BookClassParams {
    pub student_id: StudentId,
    pub teacher_id: TeacherId,
    pub slot_id: SlotId,
    pub scheduled_at: DateTime<Utc>,
    #[builder(default = 60)]
    pub duration_minutes: i32,
    #[builder(default)]
    pub topic: Option<String>,
}

pub async fn book_class(
    params: BookClassParams,
    deps: &ServerDeps,
) -> Result<StudentClass, SchedulingError> {
    let pool = &deps.db_pool;
    let now = Utc::now();

    let teacher = Teacher::find_by_id(params.teacher_id, pool)
        .await?
        .ok_or(SchedulingError::NotFound { entity: "teacher" })?;

    policy::check_lead_time(now, params.scheduled_at, teacher.booking_lead_time_hours)?;
    policy::check_horizon(now, params.scheduled_at, teacher.booking_horizon_days)?;

    let slot = AvailabilitySlot::find_by_id(params.slot_id, pool)
        .await?
        .ok_or(SchedulingError::NotFound {
            entity: "availability slot",
        })?;
    if slot.teacher_id != params.teacher_id {
        return Err(SchedulingError::Validation(
            "slot does not belong to this teacher".into(),
        ));
    }
    if !slot.occurs_on(params.scheduled_at.date_naive()) {
        return Err(SchedulingError::Validation(
            "slot has no occurrence on the requested date".into(),
        ));
    }

    // A booking on a makeup slot produces a makeup class
    let class_type = match slot.kind {
        SlotKind::Makeup => ClassType::Makeup,
        SlotKind::Regular => ClassType::Regular,
    };

    let class = run_serializable(pool, "book_class", |conn| {
        let params = params.clone();
        Box::pin(async move {
            let student = Student::find_by_id(params.student_id, &mut *conn)
                .await?
                .ok_or(SchedulingError::NotFound { entity: "student" })?;
            if student.class_credit_balance < 1 {
                return Err(SchedulingError::InsufficientCredits);
            }

            // A forfeited occurrence (late student cancellation) keeps its
            // exception; it is not open for rebooking.
            if AvailabilityException::exists_at(params.slot_id, params.scheduled_at, &mut *conn)
                .await?
            {
                return Err(SchedulingError::SlotAlreadyBooked(params.scheduled_at));
            }

            if let Some(existing) = StudentClass::find_scheduled_for_teacher_at(
                params.teacher_id,
                params.scheduled_at,
                params.duration_minutes,
                &mut *conn,
            )
            .await?
            {
                return Err(SchedulingError::SlotAlreadyBooked(existing.scheduled_at));
            }

            let new = NewClass::builder()
                .student_id(params.student_id)
                .teacher_id(Some(params.teacher_id))
                .scheduled_at(params.scheduled_at)
                .duration_minutes(params.duration_minutes)
                .class_type(class_type)
                .topic(params.topic.clone())
                .availability_slot_id(Some(params.slot_id))
                .build();
            let class = StudentClass::insert(&new, &mut *conn).await?;

            Student::adjust_credit_balance(params.student_id, -1, &mut *conn).await?;

            AvailabilityException::insert(
                params.slot_id,
                params.teacher_id,
                params.scheduled_at,
                &mut *conn,
            )
            .await?;

            Ok(class)
        }) as BoxFuture<'_, Result<StudentClass, SchedulingError>>
    })
    .await?;

    tracing::info!(
        class_id = %class.id,
        student_id = %class.student_id,
        teacher_id = %params.teacher_id,
        scheduled_at = %class.scheduled_at,
        "class booked"
    );

    Ok(class)
}
