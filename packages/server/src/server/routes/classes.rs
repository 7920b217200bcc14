//! Class lifecycle endpoints: book, cancel, reschedule, status updates and
//! release of cancelled classes.

use axum::extract::{Extension, Path};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::common::{ClassId, SlotId, StudentId, TeacherId};
use crate::domains::classes::{CancelActor, ClassStatus, StudentClass};
use crate::domains::scheduling::{
    book_class, cancel_class, release_canceled_class, reschedule_class, update_class_status,
    BookClassParams, CancelClassParams, RescheduleClassParams,
};
use crate::server::app::AppState;
use crate::server::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct BookClassRequest {
    pub student_id: StudentId,
    pub teacher_id: TeacherId,
    pub slot_id: SlotId,
    pub scheduled_at: DateTime<Utc>,
    #[serde(default)]
    pub duration_minutes: Option<i32>,
    #[serde(default)]
    pub topic: Option<String>,
}

pub async fn book_class_handler(
    Extension(state): Extension<AppState>,
    Json(request): Json<BookClassRequest>,
) -> Result<Json<StudentClass>, ApiError> {
    let params = BookClassParams::builder()
        .student_id(request.student_id)
        .teacher_id(request.teacher_id)
        .slot_id(request.slot_id)
        .scheduled_at(request.scheduled_at)
        .duration_minutes(request.duration_minutes.unwrap_or(60))
        .topic(request.topic)
        .build();

    let class = book_class(params, &state.deps).await?;
    Ok(Json(class))
}

#[derive(Debug, Deserialize)]
pub struct CancelClassRequest {
    pub actor: CancelActor,
    pub canceled_by: Uuid,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub allow_makeup: bool,
}

pub async fn cancel_class_handler(
    Extension(state): Extension<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<CancelClassRequest>,
) -> Result<Json<StudentClass>, ApiError> {
    let params = CancelClassParams::builder()
        .class_id(ClassId::from_uuid(id))
        .actor(request.actor)
        .canceled_by(request.canceled_by)
        .reason(request.reason)
        .allow_makeup(request.allow_makeup)
        .build();

    let class = cancel_class(params, &state.deps).await?;
    Ok(Json(class))
}

#[derive(Debug, Deserialize)]
pub struct RescheduleClassRequest {
    pub rescheduled_by: CancelActor,
    pub new_scheduled_at: DateTime<Utc>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub availability_slot_id: Option<SlotId>,
}

pub async fn reschedule_class_handler(
    Extension(state): Extension<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<RescheduleClassRequest>,
) -> Result<Json<StudentClass>, ApiError> {
    let params = RescheduleClassParams::builder()
        .class_id(ClassId::from_uuid(id))
        .rescheduled_by(request.rescheduled_by)
        .new_scheduled_at(request.new_scheduled_at)
        .reason(request.reason)
        .availability_slot_id(request.availability_slot_id)
        .build();

    let class = reschedule_class(params, &state.deps).await?;
    Ok(Json(class))
}

#[derive(Debug, Deserialize)]
pub struct UpdateClassStatusRequest {
    pub status: ClassStatus,
}

pub async fn update_class_status_handler(
    Extension(state): Extension<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateClassStatusRequest>,
) -> Result<Json<StudentClass>, ApiError> {
    let class =
        update_class_status(ClassId::from_uuid(id), request.status, &state.deps).await?;
    Ok(Json(class))
}

pub async fn release_class_handler(
    Extension(state): Extension<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    release_canceled_class(ClassId::from_uuid(id), &state.deps).await?;
    Ok(Json(serde_json::json!({ "released": true })))
}

pub async fn list_student_classes_handler(
    Extension(state): Extension<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<StudentClass>>, ApiError> {
    let classes = StudentClass::find_for_student(StudentId::from_uuid(id), &state.deps.db_pool)
        .await
        .map_err(crate::domains::scheduling::SchedulingError::Internal)?;
    Ok(Json(classes))
}
