//! Template engine endpoints: generate classes from a template and apply
//! schedule edits.

use axum::extract::{Extension, Path};
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use crate::common::StudentId;
use crate::domains::templates::{
    generate_classes_from_template, update_schedule_and_prune, TemplateEntry, TemplateEntryInput,
};
use crate::server::app::AppState;
use crate::server::error::ApiError;

#[derive(Serialize)]
pub struct GenerateClassesResponse {
    pub created: usize,
}

pub async fn generate_classes_handler(
    Extension(state): Extension<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<GenerateClassesResponse>, ApiError> {
    let created =
        generate_classes_from_template(StudentId::from_uuid(id), &state.deps).await?;
    Ok(Json(GenerateClassesResponse {
        created: created.len(),
    }))
}

pub async fn update_schedule_handler(
    Extension(state): Extension<AppState>,
    Path(id): Path<Uuid>,
    Json(entries): Json<Vec<TemplateEntryInput>>,
) -> Result<Json<Vec<TemplateEntry>>, ApiError> {
    let saved =
        update_schedule_and_prune(StudentId::from_uuid(id), entries, &state.deps).await?;
    Ok(Json(saved))
}
