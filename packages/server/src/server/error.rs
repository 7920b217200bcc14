//! Maps engine errors onto HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::domains::scheduling::SchedulingError;

/// Wrapper so handlers can return `Result<Json<T>, ApiError>`.
pub struct ApiError(pub SchedulingError);

impl From<SchedulingError> for ApiError {
    fn from(err: SchedulingError) -> Self {
        Self(err)
    }
}

fn classify(err: &SchedulingError) -> (StatusCode, &'static str) {
    use SchedulingError::*;
    match err {
        Validation(_) => (StatusCode::BAD_REQUEST, "validation"),
        NotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
        InsufficientCredits => (StatusCode::UNPROCESSABLE_ENTITY, "insufficient_credits"),
        SlotAlreadyBooked(_) => (StatusCode::UNPROCESSABLE_ENTITY, "slot_already_booked"),
        LeadTimeViolation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "lead_time_violation"),
        HorizonViolation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "horizon_violation"),
        SlotOverlap => (StatusCode::UNPROCESSABLE_ENTITY, "slot_overlap"),
        MonthlyQuotaExceeded(_) => (StatusCode::UNPROCESSABLE_ENTITY, "monthly_quota_exceeded"),
        MakeupCreditRequired => (StatusCode::UNPROCESSABLE_ENTITY, "makeup_credit_required"),
        NotReschedulable => (StatusCode::UNPROCESSABLE_ENTITY, "not_reschedulable"),
        InvalidStatusTransition { .. } => {
            (StatusCode::UNPROCESSABLE_ENTITY, "invalid_status_transition")
        }
        TemplateRegenerationBlocked => (
            StatusCode::UNPROCESSABLE_ENTITY,
            "template_regeneration_blocked",
        ),
        VacationLeadTime(_) => (StatusCode::UNPROCESSABLE_ENTITY, "vacation_lead_time"),
        VacationTooLong(_) => (StatusCode::UNPROCESSABLE_ENTITY, "vacation_too_long"),
        VacationBalanceExceeded(_) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            "vacation_balance_exceeded",
        ),
        Conflict => (StatusCode::CONFLICT, "conflict"),
        Database(_) | Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = classify(&self.0);

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self.0, "request failed");
            // Don't leak internals to the client
            return (
                status,
                Json(json!({ "error": "internal server error", "code": code })),
            )
                .into_response();
        }

        (
            status,
            Json(json!({ "error": self.0.to_string(), "code": code })),
        )
            .into_response()
    }
}
