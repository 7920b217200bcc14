//! Application setup and router wiring.

use std::sync::Arc;

use axum::{
    extract::Extension,
    routing::{delete, get, patch, post, put},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::kernel::ServerDeps;
use crate::server::routes::{
    book_class_handler, cancel_class_handler, create_slot_handler, create_vacation_handler,
    delete_slot_handler, delete_vacation_handler, generate_classes_handler, health_handler,
    list_slots_handler, list_student_classes_handler, list_student_credits_handler,
    list_teacher_vacations_handler, release_class_handler, reschedule_class_handler,
    update_class_status_handler, update_schedule_handler,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub deps: Arc<ServerDeps>,
}

/// Build the axum application. Routes map 1:1 to scheduling engine
/// operations.
pub fn build_app(deps: Arc<ServerDeps>) -> Router {
    let state = AppState { deps };

    Router::new()
        .route("/health", get(health_handler))
        // Scheduling engine
        .route("/classes", post(book_class_handler))
        .route("/classes/:id/cancel", post(cancel_class_handler))
        .route("/classes/:id/reschedule", post(reschedule_class_handler))
        .route("/classes/:id/status", patch(update_class_status_handler))
        .route("/classes/:id/release", post(release_class_handler))
        // Template engine
        .route(
            "/students/:id/classes/generate",
            post(generate_classes_handler),
        )
        .route("/students/:id/schedule", put(update_schedule_handler))
        .route("/students/:id/classes", get(list_student_classes_handler))
        .route("/students/:id/credits", get(list_student_credits_handler))
        // Vacations
        .route("/vacations", post(create_vacation_handler))
        .route("/vacations/:id", delete(delete_vacation_handler))
        .route("/teachers/:id/vacations", get(list_teacher_vacations_handler))
        // Availability
        .route("/availability", post(create_slot_handler))
        .route("/availability/:id", delete(delete_slot_handler))
        .route("/teachers/:id/availability", get(list_slots_handler))
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
}
