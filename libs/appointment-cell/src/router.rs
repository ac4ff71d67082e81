use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_database::AppState;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

/// Patient-facing routes; no token required.
pub fn public_appointment_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/appointments", post(handlers::book_appointment))
        .route("/patient/records", get(handlers::patient_records))
        .with_state(state)
}

/// Staff routes for doctors viewing their own patients and recording sessions.
pub fn staff_appointment_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/doctor/patients", get(handlers::doctor_patients))
        .route(
            "/session-results",
            get(handlers::get_session_result).post(handlers::submit_session_result),
        )
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}

/// Mounted under `/admin`.
pub fn admin_appointment_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/appointments",
            get(handlers::list_appointments_admin).patch(handlers::update_appointment_admin),
        )
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
