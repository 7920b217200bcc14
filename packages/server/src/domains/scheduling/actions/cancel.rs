//! Cancellation workflow: three entry branches (student / teacher / admin)
//! unified behind one operation.
//!
//! Slot handling per branch:
//! - student, early: slot freed; late: slot stays forfeited for that date.
//!   No credit refund in either branch.
//! - teacher: slot always freed; a 45-day makeup credit is granted only
//!   when `allow_makeup` is set.
//! - admin: slot freed, no credit logic.

use chrono::Utc;
use futures::future::BoxFuture;
use typed_builder::TypedBuilder;
use uuid::Uuid;

use crate::common::ClassId;
use crate::domains::availability::AvailabilityException;
use crate::domains::classes::{CancelActor, ClassStatus, StudentClass};
use crate::domains::credits::Credit;
use crate::domains::scheduling::{effects, policy, SchedulingError};
use crate::domains::teachers::Teacher;
use crate::kernel::{run_serializable, ServerDeps};

#[derive(Debug, Clone, TypedBuilder)]
pub struct CancelClassParams {
    pub class_id: ClassId,
    pub actor: CancelActor,
    /// The user performing the cancellation.
    pub canceled_by: Uuid,
    #[builder(default)]
    pub reason: Option<String>,
    #[builder(default = false)]
    pub allow_makeup: bool,
}

pub async fn cancel_class(
    params: CancelClassParams,
    deps: &ServerDeps,
) -> Result<StudentClass, SchedulingError> {
    let pool = &deps.db_pool;
    let now = Utc::now();

    let target_status = match (params.actor, params.allow_makeup) {
        (CancelActor::Student, _) => ClassStatus::CanceledStudent,
        (CancelActor::Teacher, true) => ClassStatus::CanceledTeacherMakeup,
        (CancelActor::Teacher, false) => ClassStatus::CanceledTeacher,
        (CancelActor::Admin, _) => ClassStatus::CanceledAdmin,
    };

    let (class, makeup_granted) = run_serializable(pool, "cancel_class", |conn| {
        let params = params.clone();
        Box::pin(async move {
            let class = StudentClass::find_by_id(params.class_id, &mut *conn)
                .await?
                .ok_or(SchedulingError::NotFound { entity: "class" })?;

            if !class.status.can_transition_to(target_status) {
                return Err(SchedulingError::InvalidStatusTransition {
                    from: class.status,
                    to: target_status,
                });
            }

            // Free the slot unless a student cancelled late, in which case
            // the occurrence stays blocked for that date.
            let free_slot = match params.actor {
                CancelActor::Student => {
                    let policy_hours = match class.teacher_id {
                        Some(teacher_id) => Teacher::find_by_id(teacher_id, &mut *conn)
                            .await?
                            .map(|t| t.cancellation_policy_hours)
                            .unwrap_or(24),
                        None => 24,
                    };
                    !policy::is_late_cancellation(now, class.scheduled_at, policy_hours)
                }
                CancelActor::Teacher | CancelActor::Admin => true,
            };

            if free_slot {
                if let Some(slot_id) = class.availability_slot_id {
                    AvailabilityException::delete_occurrence(
                        slot_id,
                        class.scheduled_at,
                        &mut *conn,
                    )
                    .await?;
                }
            }

            let mut makeup_granted = false;
            if target_status == ClassStatus::CanceledTeacherMakeup {
                Credit::grant_teacher_cancellation(class.student_id, now, &mut *conn).await?;
                makeup_granted = true;
            }

            let updated = StudentClass::set_canceled(
                class.id,
                target_status,
                params.actor,
                params.canceled_by,
                params.reason.as_deref(),
                &mut *conn,
            )
            .await?;

            Ok((updated, makeup_granted))
        }) as BoxFuture<'_, Result<(StudentClass, bool), SchedulingError>>
    })
    .await?;

    tracing::info!(
        class_id = %class.id,
        status = ?class.status,
        actor = ?params.actor,
        makeup_granted,
        "class canceled"
    );

    effects::notify_class_canceled(deps, &class, params.actor, makeup_granted).await;

    Ok(class)
}
