// =====================================================================================
// SECURITY CELL HANDLERS
// =====================================================================================

use std::sync::Arc;

use axum::{
    extract::{Extension, State},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_database::AppState;
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_models::extract::{AppJson, AppPath};
use shared_utils::extractor::require_admin;

use crate::models::{CredentialError, ResetCredentialsRequest};
use crate::services::CredentialService;

impl From<CredentialError> for AppError {
    fn from(e: CredentialError) -> Self {
        match e {
            CredentialError::MissingFields => AppError::BadRequest(e.to_string()),
            CredentialError::NoLinkedUser => AppError::NotFound(e.to_string()),
            CredentialError::EmailInUse => AppError::Conflict(e.to_string()),
            CredentialError::Hashing(_) => AppError::Internal(e.to_string()),
            CredentialError::Database(msg) => AppError::Database(msg),
        }
    }
}

#[axum::debug_handler]
pub async fn reset_doctor_credentials(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    AppPath(doctor_id): AppPath<Uuid>,
    AppJson(request): AppJson<ResetCredentialsRequest>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    let service = CredentialService::new(&state);
    let updated_email = service.reset_doctor_credentials(doctor_id, request).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Credentials updated successfully",
        "updatedEmail": updated_email
    })))
}
