//! Credit ledger read endpoint.

use axum::extract::{Extension, Path};
use axum::Json;
use uuid::Uuid;

use crate::common::StudentId;
use crate::domains::credits::Credit;
use crate::domains::scheduling::SchedulingError;
use crate::server::app::AppState;
use crate::server::error::ApiError;

pub async fn list_student_credits_handler(
    Extension(state): Extension<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Credit>>, ApiError> {
    let credits = Credit::find_for_student(StudentId::from_uuid(id), &state.deps.db_pool)
        .await
        .map_err(SchedulingError::Internal)?;
    Ok(Json(credits))
}
