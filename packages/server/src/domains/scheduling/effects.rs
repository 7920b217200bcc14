//! Post-commit side effects.
//!
//! Contract: nothing in this module ever fails the calling workflow. Every
//! delivery error is logged at `warn` and dropped. Callers invoke these after
//! their transaction commits; there is no ordering guarantee between effects.

use crate::domains::classes::{CancelActor, StudentClass};
use crate::kernel::{ClassCanceledNotice, ClassRescheduledNotice, ServerDeps, TeacherVacationNotice};

pub async fn notify_class_canceled(
    deps: &ServerDeps,
    class: &StudentClass,
    actor: CancelActor,
    makeup_granted: bool,
) {
    let notice = ClassCanceledNotice {
        class_id: class.id,
        student_id: class.student_id,
        teacher_id: class.teacher_id,
        scheduled_at: class.scheduled_at,
        canceled_by: match actor {
            CancelActor::Student => "student",
            CancelActor::Teacher => "teacher",
            CancelActor::Admin => "admin",
        }
        .to_string(),
        makeup_granted,
        reason: class.cancel_reason.clone(),
    };

    if let Err(e) = deps.notifications.send_class_canceled_email(&notice).await {
        tracing::warn!(class_id = %class.id, error = %e, "cancel email failed (non-fatal)");
    }

    let body = if makeup_granted {
        "Your class was canceled by the teacher. A makeup credit was added to your account."
    } else {
        "Your class was canceled."
    };
    if let Err(e) = deps
        .announcements
        .create_announcement(class.student_id.into_uuid(), "Class canceled", body)
        .await
    {
        tracing::warn!(class_id = %class.id, error = %e, "cancel announcement failed (non-fatal)");
    }
}

pub async fn notify_class_rescheduled(
    deps: &ServerDeps,
    original: &StudentClass,
    new_class: &StudentClass,
) {
    let notice = ClassRescheduledNotice {
        original_class_id: original.id,
        new_class_id: new_class.id,
        student_id: new_class.student_id,
        teacher_id: new_class.teacher_id,
        old_scheduled_at: original.scheduled_at,
        new_scheduled_at: new_class.scheduled_at,
    };

    if let Err(e) = deps
        .notifications
        .send_class_rescheduled_email(&notice)
        .await
    {
        tracing::warn!(
            class_id = %new_class.id,
            error = %e,
            "reschedule email failed (non-fatal)"
        );
    }
}

pub async fn notify_vacation(deps: &ServerDeps, notice: &TeacherVacationNotice, created: bool) {
    let result = if created {
        deps.notifications.send_teacher_vacation_email(notice).await
    } else {
        deps.notifications
            .send_teacher_vacation_canceled_email(notice)
            .await
    };
    if let Err(e) = result {
        tracing::warn!(
            vacation_id = %notice.vacation_id,
            error = %e,
            "vacation email failed (non-fatal)"
        );
    }
}

pub async fn ping_achievements(deps: &ServerDeps, class: &StudentClass) {
    if let Err(e) = deps
        .achievements
        .class_completed(class.student_id, class.id)
        .await
    {
        tracing::warn!(
            class_id = %class.id,
            error = %e,
            "achievement re-evaluation failed (non-fatal)"
        );
    }
}
