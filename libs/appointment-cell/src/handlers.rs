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
use shared_models::extract::{AppJson, AppQuery};
use shared_utils::extractor::{require_admin, require_staff_for_doctor};

use crate::models::{
    AppointmentError, AppointmentWithDoctor, BookAppointmentRequest, BookingError, DoctorPatientsQuery, PatientRecordsQuery,
    SessionResultQuery, SubmitSessionResultRequest, UpdateAppointmentRequest,
};
use crate::services::{AppointmentBookingService, AppointmentService};

impl From<BookingError> for AppError {
    fn from(e: BookingError) -> Self {
        match e {
            BookingError::MissingFields | BookingError::InvalidDate(_) => AppError::BadRequest(e.to_string()),
            BookingError::DoctorNotFound => AppError::NotFound(e.to_string()),
            BookingError::NoAvailability => AppError::Conflict(e.to_string()),
            BookingError::DatabaseError(msg) => AppError::Database(msg),
        }
    }
}

impl From<AppointmentError> for AppError {
    fn from(e: AppointmentError) -> Self {
        match e {
            AppointmentError::NotFound
            | AppointmentError::SessionRecordNotFound
            | AppointmentError::NoPatientRecords => AppError::NotFound(e.to_string()),
            AppointmentError::ValidationError(msg) => AppError::BadRequest(msg),
            AppointmentError::DatabaseError(msg) => AppError::Database(msg),
        }
    }
}

// ==============================================================================
// PUBLIC
// ==============================================================================

#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<Arc<AppState>>,
    AppJson(request): AppJson<BookAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let service = AppointmentBookingService::new(&state);
    let outcome = service.book_appointment(request).await?;

    let assigned_time = outcome.appointment.time_slot.clone();
    let assigned_room = outcome.appointment.room.clone();
    let appointment = AppointmentWithDoctor {
        appointment: outcome.appointment,
        doctor: Some(outcome.doctor),
    };

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "assignedTime": assigned_time,
        "assignedRoom": assigned_room,
        "queuePosition": outcome.queue_position,
        "smsSent": outcome.sms_sent
    })))
}

#[axum::debug_handler]
pub async fn patient_records(
    State(state): State<Arc<AppState>>,
    AppQuery(query): AppQuery<PatientRecordsQuery>,
) -> Result<Json<Value>, AppError> {
    let phone = query
        .phone
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::BadRequest("Phone number is required".to_string()))?;

    let patients = AppointmentService::new(&state).patient_records(&phone).await?;

    Ok(Json(json!({
        "success": true,
        "patients": patients
    })))
}

// ==============================================================================
// ADMIN
// ==============================================================================

#[axum::debug_handler]
pub async fn list_appointments_admin(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    let appointments = AppointmentService::new(&state).list_all().await?;

    Ok(Json(json!({
        "success": true,
        "appointments": appointments
    })))
}

#[axum::debug_handler]
pub async fn update_appointment_admin(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    AppJson(request): AppJson<UpdateAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    let appointment = AppointmentService::new(&state).update_appointment(request).await?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment
    })))
}

// ==============================================================================
// DOCTOR
// ==============================================================================

#[axum::debug_handler]
pub async fn doctor_patients(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    AppQuery(query): AppQuery<DoctorPatientsQuery>,
) -> Result<Json<Value>, AppError> {
    let doctor_id = query
        .doctor_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::BadRequest("doctorId is required".to_string()))?;

    require_staff_for_doctor(&user, &doctor_id)?;

    let doctor_id = Uuid::parse_str(&doctor_id)
        .map_err(|_| AppError::BadRequest(format!("Invalid doctorId: {}", doctor_id)))?;
    let appointments = AppointmentService::new(&state).doctor_patients(doctor_id).await?;

    Ok(Json(json!({
        "success": true,
        "appointments": appointments
    })))
}

#[axum::debug_handler]
pub async fn submit_session_result(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    AppJson(request): AppJson<SubmitSessionResultRequest>,
) -> Result<Json<Value>, AppError> {
    let appointment_id = request
        .appointment_id
        .ok_or_else(|| AppError::BadRequest("appointmentId is required".to_string()))?;

    let service = AppointmentService::new(&state);
    let appointment = service.get_appointment(appointment_id).await?;
    require_staff_for_doctor(&user, &appointment.doctor_id.to_string())?;

    let record = service.record_session(&appointment, request).await?;

    Ok(Json(json!({
        "success": true,
        "sessionRecord": record
    })))
}

#[axum::debug_handler]
pub async fn get_session_result(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    AppQuery(query): AppQuery<SessionResultQuery>,
) -> Result<Json<Value>, AppError> {
    let appointment_id = query
        .appointment_id
        .ok_or_else(|| AppError::BadRequest("appointmentId is required".to_string()))?;

    let service = AppointmentService::new(&state);
    let appointment = service.get_appointment(appointment_id).await?;
    require_staff_for_doctor(&user, &appointment.doctor_id.to_string())?;

    let record = service.session_record(appointment_id).await?;

    Ok(Json(json!({
        "success": true,
        "sessionRecord": record,
        "appointment": appointment
    })))
}
