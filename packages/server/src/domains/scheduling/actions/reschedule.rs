//! Rescheduling workflow.
//!
//! The original record goes terminal (`rescheduled`), its slot occurrence is
//! released, and a fresh record is issued at the new time, linked through
//! `rescheduled_from`. A student
//! rescheduling a teacher-makeup class must hold a live teacher-cancellation
//! credit; that path skips the monthly quota. Every other student reschedule
//! counts against the 2-per-month cap.
//!
//! Credit consumption is intentionally a second step after the transaction
//! commits: the marking is idempotent and at-least-once, never part of the
//! primary commit.

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use typed_builder::TypedBuilder;

use crate::common::{ClassId, SlotId};
use crate::domains::availability::AvailabilityException;
use crate::domains::classes::{CancelActor, ClassStatus, NewClass, StudentClass};
use crate::domains::credits::{Credit, CreditType};
use crate::domains::scheduling::{effects, policy, SchedulingError};
use crate::domains::students::Student;
use crate::domains::teachers::Teacher;
use crate::kernel::{run_serializable, ServerDeps};

#[derive(Debug, Clone, TypedBuilder)]
pub struct RescheduleClassParams {
    pub class_id: ClassId,
    /// Role of the user driving the reschedule; the student path carries the
    /// credit/quota rules.
    pub rescheduled_by: CancelActor,
    pub new_scheduled_at: DateTime<Utc>,
    #[builder(default)]
    pub reason: Option<String>,
    /// Concrete slot chosen for the new time, when the caller picked one.
    #[builder(default)]
    pub availability_slot_id: Option<SlotId>,
}

pub async fn reschedule_class(
    params: RescheduleClassParams,
    deps: &ServerDeps,
) -> Result<StudentClass, SchedulingError> {
    let pool = &deps.db_pool;
    let now = Utc::now();

    // Policy settings come from the class's teacher (defaults when unassigned)
    let preview = StudentClass::find_by_id(params.class_id, pool)
        .await?
        .ok_or(SchedulingError::NotFound { entity: "class" })?;
    let (lead_hours, horizon_days) = match preview.teacher_id {
        Some(teacher_id) => Teacher::find_by_id(teacher_id, pool)
            .await?
            .map(|t| (t.booking_lead_time_hours, t.booking_horizon_days))
            .unwrap_or((24, 30)),
        None => (24, 30),
    };
    policy::check_lead_time(now, params.new_scheduled_at, lead_hours)?;
    policy::check_horizon(now, params.new_scheduled_at, horizon_days)?;

    let (original, new_class, used_credit) =
        run_serializable(pool, "reschedule_class", |conn| {
            let params = params.clone();
            Box::pin(async move {
                let class = StudentClass::find_by_id(params.class_id, &mut *conn)
                    .await?
                    .ok_or(SchedulingError::NotFound { entity: "class" })?;

                if !class.status.is_reschedulable_source() || !class.reschedulable {
                    return Err(SchedulingError::NotReschedulable);
                }
                // Classes funded by a non-reschedulable credit are single-shot
                if let Some(credit_type) = class.credit_type {
                    if !credit_type.is_reschedulable() {
                        return Err(SchedulingError::NotReschedulable);
                    }
                }

                let mut used_credit: Option<Credit> = None;
                let mut counts_against_quota = false;

                if params.rescheduled_by == CancelActor::Student {
                    if class.status == ClassStatus::CanceledTeacherMakeup {
                        // Makeup path: a live credit is mandatory, quota-free
                        let credit = Credit::find_usable(
                            class.student_id,
                            CreditType::TeacherCancellation,
                            now,
                            &mut *conn,
                        )
                        .await?
                        .ok_or(SchedulingError::MakeupCreditRequired)?;
                        used_credit = Some(credit);
                    } else {
                        let student = Student::find_by_id(class.student_id, &mut *conn)
                            .await?
                            .ok_or(SchedulingError::NotFound { entity: "student" })?;
                        policy::check_monthly_quota(
                            student.reschedules_in(&policy::month_key(now)),
                        )?;
                        counts_against_quota = true;
                    }
                }

                if let Some(teacher_id) = class.teacher_id {
                    if let Some(existing) = StudentClass::find_scheduled_for_teacher_at(
                        teacher_id,
                        params.new_scheduled_at,
                        class.duration_minutes,
                        &mut *conn,
                    )
                    .await?
                    {
                        return Err(SchedulingError::SlotAlreadyBooked(existing.scheduled_at));
                    }
                }

                let original =
                    StudentClass::set_status(class.id, ClassStatus::Rescheduled, &mut *conn)
                        .await?;

                // The original booking no longer occupies its occurrence
                if let Some(slot_id) = class.availability_slot_id {
                    AvailabilityException::delete_occurrence(
                        slot_id,
                        class.scheduled_at,
                        &mut *conn,
                    )
                    .await?;
                }

                let new = NewClass::builder()
                    .student_id(class.student_id)
                    .teacher_id(class.teacher_id)
                    .scheduled_at(params.new_scheduled_at)
                    .duration_minutes(class.duration_minutes)
                    .class_type(class.class_type)
                    .topic(class.topic.clone())
                    .credit_id(used_credit.as_ref().map(|c| c.id))
                    .credit_type(used_credit.as_ref().map(|c| c.credit_type))
                    // A credit is single use: the new class can't move again
                    .reschedulable(used_credit.is_none())
                    .rescheduled_from(Some(class.id))
                    .availability_slot_id(params.availability_slot_id)
                    .build();
                let new_class = StudentClass::insert(&new, &mut *conn).await?;

                if let (Some(slot_id), Some(teacher_id)) =
                    (params.availability_slot_id, class.teacher_id)
                {
                    AvailabilityException::insert(
                        slot_id,
                        teacher_id,
                        params.new_scheduled_at,
                        &mut *conn,
                    )
                    .await?;
                }

                if counts_against_quota {
                    Student::increment_monthly_reschedules(
                        class.student_id,
                        &policy::month_key(now),
                        &mut *conn,
                    )
                    .await?;
                }

                Ok((original, new_class, used_credit))
            })
                as BoxFuture<'_, Result<(StudentClass, StudentClass, Option<Credit>), SchedulingError>>
        })
        .await?;

    // At-least-once consumption marking, outside the primary transaction.
    if let Some(credit) = &used_credit {
        match Credit::mark_consumed(credit.id, new_class.id, pool).await {
            Ok(true) => {
                tracing::debug!(credit_id = %credit.id, class_id = %new_class.id, "credit consumed")
            }
            Ok(false) => {
                tracing::warn!(credit_id = %credit.id, "credit was already consumed")
            }
            Err(e) => {
                tracing::warn!(
                    credit_id = %credit.id,
                    error = %e,
                    "failed to mark credit consumed (will read as unconsumed)"
                );
            }
        }
    }

    tracing::info!(
        original_class_id = %original.id,
        new_class_id = %new_class.id,
        new_scheduled_at = %new_class.scheduled_at,
        used_credit = used_credit.is_some(),
        reason = ?params.reason,
        "class rescheduled"
    );

    effects::notify_class_rescheduled(deps, &original, &new_class).await;

    Ok(new_class)
}
