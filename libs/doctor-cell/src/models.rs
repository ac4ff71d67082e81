use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

// ==============================================================================
// STORED ENTITIES
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    pub id: Uuid,
    pub name: String,
    pub specialty: String,
    pub bio: Option<String>,
    pub experience: Option<i32>,
    pub consult_fee: Option<i32>,
    pub rating: Option<f32>,
    pub available: bool,
    pub available_days: Option<String>,
    pub available_time: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

/// One bookable `(doctor, date, time)` unit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimeSlot {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub date: NaiveDate,
    pub time: String,
    pub room: String,
    pub is_booked: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailableDate {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorWithSlots {
    #[serde(flatten)]
    pub doctor: Doctor,
    #[serde(default)]
    pub time_slots: Vec<TimeSlot>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CountRow {
    pub count: i64,
}

/// Row shape of the admin doctor listing, embeds included.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminDoctorRow {
    #[serde(flatten)]
    pub doctor: Doctor,
    #[serde(default)]
    pub time_slots: Vec<TimeSlot>,
    #[serde(default)]
    pub available_dates: Vec<AvailableDate>,
    #[serde(default)]
    pub appointments: Vec<CountRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminDoctorView {
    #[serde(flatten)]
    pub doctor: Doctor,
    pub time_slots: Vec<TimeSlot>,
    pub available_dates: Vec<AvailableDate>,
    pub appointment_count: i64,
    pub user_email: Option<String>,
}

// ==============================================================================
// REQUESTS
// ==============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDoctorRequest {
    pub name: Option<String>,
    pub specialty: Option<String>,
    pub bio: Option<String>,
    pub experience: Option<i32>,
    pub consult_fee: Option<i32>,
    pub rating: Option<f32>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDoctorRequest {
    pub id: Option<Uuid>,
    pub name: Option<String>,
    pub specialty: Option<String>,
    pub bio: Option<String>,
    pub experience: Option<i32>,
    pub consult_fee: Option<i32>,
    pub rating: Option<f32>,
    pub available: Option<bool>,
    pub available_days: Option<String>,
    pub available_time: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeleteDoctorRequest {
    pub id: Option<Uuid>,
}

/// A "session": `count` consecutive slots starting at `start_time`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSlotsRequest {
    pub date: Option<String>,
    pub start_time: Option<String>,
    pub count: Option<u32>,
    pub duration: Option<u32>,
    pub room: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteSlotsRequest {
    pub slot_id: Option<Uuid>,
    pub date: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotDeletion {
    pub deleted: usize,
    pub cancelled_appointments: usize,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, Clone)]
pub enum DoctorError {
    NotFound,
    EmailInUse,
    ValidationError(String),
    DatabaseError(String),
}

impl std::fmt::Display for DoctorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DoctorError::NotFound => write!(f, "Doctor not found"),
            DoctorError::EmailInUse => write!(f, "Email already in use"),
            DoctorError::ValidationError(msg) => write!(f, "{}", msg),
            DoctorError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
        }
    }
}

impl std::error::Error for DoctorError {}

#[derive(Debug, Error)]
pub enum SlotError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Invalid start time (expected HH:MM): {0}")]
    InvalidStartTime(String),

    #[error("{0} must be at least 1")]
    NotPositive(&'static str),

    #[error("Duration must be between 1 and 1439 minutes, got {0}")]
    InvalidDuration(u32),

    #[error("A session of {count} x {duration} min does not fit in one day")]
    SessionTooLong { count: u32, duration: u32 },

    #[error("Slot ID or date is required")]
    MissingSelector,

    #[error("Doctor not found")]
    DoctorNotFound,

    #[error("Slot not found")]
    SlotNotFound,

    #[error("Database error: {0}")]
    Database(String),
}
