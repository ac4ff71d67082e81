use std::sync::Arc;

use axum::{
    extract::{Extension, State},
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_database::AppState;
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_models::extract::{AppJson, AppPath};
use shared_utils::extractor::require_admin;

use crate::models::{
    CreateDoctorRequest, CreateSlotsRequest, DeleteDoctorRequest, DeleteSlotsRequest, DoctorError,
    SlotError, UpdateDoctorRequest,
};
use crate::services::{doctor::DoctorService, slots::SlotService};

impl From<DoctorError> for AppError {
    fn from(e: DoctorError) -> Self {
        match e {
            DoctorError::NotFound => AppError::NotFound(e.to_string()),
            DoctorError::EmailInUse => AppError::Conflict(e.to_string()),
            DoctorError::ValidationError(msg) => AppError::ValidationError(msg),
            DoctorError::DatabaseError(msg) => AppError::Database(msg),
        }
    }
}

impl From<SlotError> for AppError {
    fn from(e: SlotError) -> Self {
        match e {
            SlotError::DoctorNotFound | SlotError::SlotNotFound => AppError::NotFound(e.to_string()),
            SlotError::Database(msg) => AppError::Database(msg),
            _ => AppError::ValidationError(e.to_string()),
        }
    }
}

// ==============================================================================
// PUBLIC HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_doctors_public(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, AppError> {
    let service = DoctorService::new(&state);
    let doctors = service.list_available_doctors(Utc::now().date_naive()).await?;

    Ok(Json(json!({
        "success": true,
        "doctors": doctors
    })))
}

// ==============================================================================
// ADMIN DOCTOR HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_doctors_admin(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    let doctors = DoctorService::new(&state).list_doctors_admin().await?;

    Ok(Json(json!({
        "success": true,
        "doctors": doctors
    })))
}

#[axum::debug_handler]
pub async fn create_doctor(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    AppJson(request): AppJson<CreateDoctorRequest>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    let (doctor, login) = DoctorService::new(&state).create_doctor(request).await?;

    Ok(Json(json!({
        "success": true,
        "doctor": doctor,
        "user": {
            "id": login.id,
            "email": login.email,
            "role": login.role
        }
    })))
}

#[axum::debug_handler]
pub async fn update_doctor(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    AppJson(request): AppJson<UpdateDoctorRequest>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    let doctor = DoctorService::new(&state).update_doctor(request).await?;

    Ok(Json(json!({
        "success": true,
        "doctor": doctor
    })))
}

#[axum::debug_handler]
pub async fn delete_doctor(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    AppJson(request): AppJson<DeleteDoctorRequest>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    let doctor_id = request
        .id
        .ok_or_else(|| AppError::ValidationError("Doctor ID is required".to_string()))?;
    DoctorService::new(&state).delete_doctor(doctor_id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Doctor deleted successfully"
    })))
}

// ==============================================================================
// ADMIN SLOT HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_slots(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    AppPath(doctor_id): AppPath<Uuid>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    let slots = SlotService::new(&state).list_slots(doctor_id).await?;

    Ok(Json(json!({
        "success": true,
        "slots": slots
    })))
}

#[axum::debug_handler]
pub async fn create_slots(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    AppPath(doctor_id): AppPath<Uuid>,
    AppJson(request): AppJson<CreateSlotsRequest>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    let requested = request.count;
    let created = SlotService::new(&state).create_session(doctor_id, request).await?;

    Ok(Json(json!({
        "success": true,
        "created": created,
        "requested": requested,
        "message": format!("{} slot(s) created", created)
    })))
}

#[axum::debug_handler]
pub async fn delete_slots(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    AppPath(doctor_id): AppPath<Uuid>,
    AppJson(request): AppJson<DeleteSlotsRequest>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    let outcome = SlotService::new(&state).delete_slots(doctor_id, request).await?;

    Ok(Json(json!({
        "success": true,
        "deleted": outcome.deleted,
        "cancelledAppointments": outcome.cancelled_appointments
    })))
}
