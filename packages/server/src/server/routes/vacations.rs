//! Vacation endpoints.

use axum::extract::{Extension, Path};
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::common::{TeacherId, VacationId};
use crate::domains::vacations::{
    create_teacher_vacation, delete_teacher_vacation, CreateVacationParams, Vacation,
};
use crate::server::app::AppState;
use crate::server::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct CreateVacationRequest {
    pub teacher_id: TeacherId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub reason: Option<String>,
}

pub async fn create_vacation_handler(
    Extension(state): Extension<AppState>,
    Json(request): Json<CreateVacationRequest>,
) -> Result<Json<Vacation>, ApiError> {
    let params = CreateVacationParams::builder()
        .teacher_id(request.teacher_id)
        .start_date(request.start_date)
        .end_date(request.end_date)
        .reason(request.reason)
        .build();

    let vacation = create_teacher_vacation(params, &state.deps).await?;
    Ok(Json(vacation))
}

pub async fn delete_vacation_handler(
    Extension(state): Extension<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    delete_teacher_vacation(VacationId::from_uuid(id), &state.deps).await?;
    Ok(Json(serde_json::json!({ "deleted": true })))
}

pub async fn list_teacher_vacations_handler(
    Extension(state): Extension<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Vacation>>, ApiError> {
    let vacations = Vacation::find_for_teacher(TeacherId::from_uuid(id), &state.deps.db_pool)
        .await
        .map_err(crate::domains::scheduling::SchedulingError::Internal)?;
    Ok(Json(vacations))
}
