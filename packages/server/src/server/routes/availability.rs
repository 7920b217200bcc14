//! Availability slot endpoints.

use axum::extract::{Extension, Path};
use axum::Json;
use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use uuid::Uuid;

use crate::common::{SlotId, TeacherId};
use crate::domains::availability::{
    create_availability_slot, delete_availability_slot, AvailabilitySlot, NewSlot, RecurrenceKind,
    SlotKind,
};
use crate::server::app::AppState;
use crate::server::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct CreateSlotRequest {
    pub teacher_id: TeacherId,
    pub day_of_week: i32,
    pub starts_at: NaiveTime,
    pub ends_at: NaiveTime,
    #[serde(default = "default_slot_kind")]
    pub kind: SlotKind,
    #[serde(default = "default_recurrence")]
    pub recurrence: RecurrenceKind,
    pub effective_from: NaiveDate,
    #[serde(default)]
    pub recurrence_until: Option<NaiveDate>,
}

fn default_slot_kind() -> SlotKind {
    SlotKind::Regular
}

fn default_recurrence() -> RecurrenceKind {
    RecurrenceKind::Weekly
}

pub async fn create_slot_handler(
    Extension(state): Extension<AppState>,
    Json(request): Json<CreateSlotRequest>,
) -> Result<Json<AvailabilitySlot>, ApiError> {
    let new = NewSlot::builder()
        .teacher_id(request.teacher_id)
        .day_of_week(request.day_of_week)
        .starts_at(request.starts_at)
        .ends_at(request.ends_at)
        .kind(request.kind)
        .recurrence(request.recurrence)
        .effective_from(request.effective_from)
        .recurrence_until(request.recurrence_until)
        .build();

    let slot = create_availability_slot(new, &state.deps).await?;
    Ok(Json(slot))
}

pub async fn delete_slot_handler(
    Extension(state): Extension<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    delete_availability_slot(SlotId::from_uuid(id), &state.deps).await?;
    Ok(Json(serde_json::json!({ "deleted": true })))
}

pub async fn list_slots_handler(
    Extension(state): Extension<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<AvailabilitySlot>>, ApiError> {
    let slots = AvailabilitySlot::find_for_teacher(TeacherId::from_uuid(id), &state.deps.db_pool)
        .await
        .map_err(crate::domains::scheduling::SchedulingError::Internal)?;
    Ok(Json(slots))
}
