//! Availability slot management.
//!
//! Slot creation enforces the per-teacher no-overlap invariant inside the
//! same serializable transaction as the insert, so two racing creates for
//! overlapping windows can't both land.

use futures::future::BoxFuture;

use crate::common::SlotId;
use crate::domains::scheduling::SchedulingError;
use crate::domains::teachers::Teacher;
use crate::kernel::{run_serializable, ServerDeps};

use super::models::{AvailabilitySlot, NewSlot};

pub async fn create_availability_slot(
    new: NewSlot,
    deps: &ServerDeps,
) -> Result<AvailabilitySlot, SchedulingError> {
    if !(0..=6).contains(&new.day_of_week) {
        return Err(SchedulingError::Validation(format!(
            "invalid day_of_week {}",
            new.day_of_week
        )));
    }
    if new.starts_at >= new.ends_at {
        return Err(SchedulingError::Validation(
            "slot start must precede slot end".into(),
        ));
    }

    let slot = run_serializable(&deps.db_pool, "create_availability_slot", |conn| {
        let new = new.clone();
        Box::pin(async move {
            Teacher::find_by_id(new.teacher_id, &mut *conn)
                .await?
                .ok_or(SchedulingError::NotFound { entity: "teacher" })?;

            AvailabilitySlot::insert_checked(&new, conn)
                .await?
                .ok_or(SchedulingError::SlotOverlap)
        }) as BoxFuture<'_, Result<AvailabilitySlot, SchedulingError>>
    })
    .await?;

    tracing::info!(
        slot_id = %slot.id,
        teacher_id = %slot.teacher_id,
        day = slot.day_of_week,
        "availability slot created"
    );

    Ok(slot)
}

pub async fn delete_availability_slot(
    slot_id: SlotId,
    deps: &ServerDeps,
) -> Result<(), SchedulingError> {
    let deleted = AvailabilitySlot::delete(slot_id, &deps.db_pool).await?;
    if !deleted {
        return Err(SchedulingError::NotFound {
            entity: "availability slot",
        });
    }
    tracing::info!(%slot_id, "availability slot deleted");
    Ok(())
}
