// =====================================================================================
// SECURITY CELL ROUTER
// =====================================================================================

use std::sync::Arc;

use axum::{middleware, routing::patch, Router};

use shared_database::AppState;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

/// Admin credential routes, mounted under `/admin`.
pub fn credential_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/doctors/{doctor_id}/credentials", patch(handlers::reset_doctor_credentials))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
