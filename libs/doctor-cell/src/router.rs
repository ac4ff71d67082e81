use std::sync::Arc;

use axum::{
    middleware,
    routing::get,
    Router,
};

use shared_database::AppState;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

/// Public doctor listing, mounted at the root.
pub fn doctor_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/doctors", get(handlers::list_doctors_public))
        .with_state(state)
}

/// Doctor and slot management, mounted under `/admin`.
pub fn admin_doctor_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/doctors",
            get(handlers::list_doctors_admin)
                .post(handlers::create_doctor)
                .patch(handlers::update_doctor)
                .delete(handlers::delete_doctor),
        )
        .route(
            "/doctors/{doctor_id}/slots",
            get(handlers::list_slots)
                .post(handlers::create_slots)
                .delete(handlers::delete_slots),
        )
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
