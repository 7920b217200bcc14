//! Direct status updates (complete / no-show) and the release of a
//! cancelled class back to an open slot.

use futures::future::BoxFuture;

use crate::common::ClassId;
use crate::domains::availability::AvailabilityException;
use crate::domains::classes::{ClassStatus, StudentClass};
use crate::domains::scheduling::{effects, SchedulingError};
use crate::kernel::{run_serializable, ServerDeps};

/// Move a class to `completed` or `no_show` (teacher/admin surface).
/// Completion pings the achievement service; that ping never fails the call.
pub async fn update_class_status(
    class_id: ClassId,
    new_status: ClassStatus,
    deps: &ServerDeps,
) -> Result<StudentClass, SchedulingError> {
    if !matches!(new_status, ClassStatus::Completed | ClassStatus::NoShow) {
        return Err(SchedulingError::Validation(
            "status updates are limited to completed and no_show".into(),
        ));
    }

    let class = run_serializable(&deps.db_pool, "update_class_status", |conn| {
        Box::pin(async move {
            let class = StudentClass::find_by_id(class_id, &mut *conn)
                .await?
                .ok_or(SchedulingError::NotFound { entity: "class" })?;

            if !class.status.can_transition_to(new_status) {
                return Err(SchedulingError::InvalidStatusTransition {
                    from: class.status,
                    to: new_status,
                });
            }

            StudentClass::set_status(class.id, new_status, &mut *conn)
                .await
                .map_err(Into::into)
        }) as BoxFuture<'_, Result<StudentClass, SchedulingError>>
    })
    .await?;

    tracing::info!(class_id = %class.id, status = ?class.status, "class status updated");

    if class.status == ClassStatus::Completed {
        effects::ping_achievements(deps, &class).await;
    }

    Ok(class)
}

/// Migrate a terminal cancelled class into history and clear any remaining
/// exception so the underlying slot reads open again. This is the only path
/// that removes a class record.
pub async fn release_canceled_class(
    class_id: ClassId,
    deps: &ServerDeps,
) -> Result<(), SchedulingError> {
    run_serializable(&deps.db_pool, "release_canceled_class", |conn| {
        Box::pin(async move {
            let class = StudentClass::find_by_id(class_id, &mut *conn)
                .await?
                .ok_or(SchedulingError::NotFound { entity: "class" })?;

            if !class.status.is_canceled() {
                return Err(SchedulingError::Validation(
                    "only cancelled classes can be released".into(),
                ));
            }

            if let Some(slot_id) = class.availability_slot_id {
                AvailabilityException::delete_occurrence(slot_id, class.scheduled_at, &mut *conn)
                    .await?;
            }

            class.archive(conn).await?;
            Ok(())
        }) as BoxFuture<'_, Result<(), SchedulingError>>
    })
    .await?;

    tracing::info!(%class_id, "cancelled class released to history");
    Ok(())
}
