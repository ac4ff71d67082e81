use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use uuid::Uuid;

use doctor_cell::Doctor;

// ==============================================================================
// APPOINTMENTS
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentStatus {
    Confirmed,
    Cancelled,
    Completed,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Confirmed => "CONFIRMED",
            AppointmentStatus::Cancelled => "CANCELLED",
            AppointmentStatus::Completed => "COMPLETED",
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppointmentStatus {
    type Err = AppointmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CONFIRMED" => Ok(AppointmentStatus::Confirmed),
            "CANCELLED" => Ok(AppointmentStatus::Cancelled),
            "COMPLETED" => Ok(AppointmentStatus::Completed),
            _ => Err(AppointmentError::ValidationError(format!("Unknown status: {}", s))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub time_slot_id: Option<Uuid>,
    pub patient_name: String,
    pub patient_email: String,
    pub patient_phone: Option<String>,
    pub date: NaiveDate,
    pub time_slot: String,
    pub room: Option<String>,
    pub notes: Option<String>,
    pub paid: bool,
    pub status: AppointmentStatus,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentWithDoctor {
    #[serde(flatten)]
    pub appointment: Appointment,
    pub doctor: Option<Doctor>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentWithSession {
    #[serde(flatten)]
    pub appointment: Appointment,
    #[serde(default, deserialize_with = "one_or_none")]
    pub session_record: Option<SessionRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorSummary {
    pub name: String,
    pub specialty: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PatientRecordRow {
    #[serde(flatten)]
    pub appointment: Appointment,
    pub doctor: Option<DoctorSummary>,
    #[serde(default, deserialize_with = "one_or_none")]
    pub session_record: Option<SessionRecord>,
}

// ==============================================================================
// SESSION RECORDS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: Uuid,
    pub appointment_id: Uuid,
    pub duration: i32,
    pub recorded_temp: Option<f64>,
    pub prescription: Option<String>,
    pub prediction: Option<String>,
    pub probability: Option<f64>,
    pub confidence: Option<f64>,
    pub avg_heart_rate: Option<f64>,
    pub avg_body_temp: Option<f64>,
    pub avg_speech_noise: Option<f64>,
    pub avg_movement: Option<f64>,
    pub avg_ecg_variability: Option<f64>,
    pub avg_facial_stress: Option<f64>,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub province: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

/// Averages reported by the monitoring session, keyed as the device sends them.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionAverages {
    pub heart_rate: Option<f64>,
    pub body_temp: Option<f64>,
    pub speech_noise_db: Option<f64>,
    pub movement_level: Option<f64>,
    pub ecg_variability: Option<f64>,
    pub facial_stress_score: Option<f64>,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub province: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitSessionResultRequest {
    pub appointment_id: Option<Uuid>,
    pub duration: Option<i32>,
    pub recorded_temp: Option<f64>,
    pub prescription: Option<String>,
    pub prediction: Option<String>,
    pub probability: Option<f64>,
    pub confidence: Option<f64>,
    pub session_averages: Option<SessionAverages>,
}

// ==============================================================================
// REQUESTS & VIEWS
// ==============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookAppointmentRequest {
    pub doctor_id: Option<String>,
    pub patient_name: Option<String>,
    pub patient_email: Option<String>,
    pub patient_phone: Option<String>,
    pub date: Option<String>,
    pub notes: Option<String>,
}

/// A booking request that passed presence and format checks.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub doctor_id: Uuid,
    pub patient_name: String,
    pub patient_email: String,
    pub patient_phone: Option<String>,
    pub date: NaiveDate,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct BookingOutcome {
    pub appointment: Appointment,
    pub doctor: Doctor,
    pub queue_position: usize,
    pub sms_sent: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateAppointmentRequest {
    pub id: Option<Uuid>,
    pub paid: Option<bool>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorPatientsQuery {
    pub doctor_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PatientRecordsQuery {
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResultQuery {
    pub appointment_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub prediction: Option<String>,
    pub probability: Option<f64>,
    pub confidence: Option<f64>,
    pub prescription: Option<String>,
    pub duration: i32,
    pub recorded_temp: Option<f64>,
    pub avg_heart_rate: Option<f64>,
    pub avg_body_temp: Option<f64>,
    pub avg_speech_noise: Option<f64>,
    pub avg_movement: Option<f64>,
    pub avg_ecg_variability: Option<f64>,
    pub avg_facial_stress: Option<f64>,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<SessionRecord> for SessionSummary {
    fn from(r: SessionRecord) -> Self {
        Self {
            prediction: r.prediction,
            probability: r.probability,
            confidence: r.confidence,
            prescription: r.prescription,
            duration: r.duration,
            recorded_temp: r.recorded_temp,
            avg_heart_rate: r.avg_heart_rate,
            avg_body_temp: r.avg_body_temp,
            avg_speech_noise: r.avg_speech_noise,
            avg_movement: r.avg_movement,
            avg_ecg_variability: r.avg_ecg_variability,
            avg_facial_stress: r.avg_facial_stress,
            created_at: r.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientAppointmentView {
    pub id: Uuid,
    pub doctor_name: Option<String>,
    pub doctor_specialty: Option<String>,
    pub date: NaiveDate,
    pub time_slot: String,
    pub status: AppointmentStatus,
    pub paid: bool,
    pub notes: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub session_record: Option<SessionSummary>,
}

impl From<PatientRecordRow> for PatientAppointmentView {
    fn from(row: PatientRecordRow) -> Self {
        let (doctor_name, doctor_specialty) = match row.doctor {
            Some(d) => (Some(d.name), Some(d.specialty)),
            None => (None, None),
        };
        Self {
            id: row.appointment.id,
            doctor_name,
            doctor_specialty,
            date: row.appointment.date,
            time_slot: row.appointment.time_slot,
            status: row.appointment.status,
            paid: row.appointment.paid,
            notes: row.appointment.notes,
            created_at: row.appointment.created_at,
            session_record: row.session_record.map(SessionSummary::from),
        }
    }
}

/// All appointments booked under one patient name for a phone number.
#[derive(Debug, Clone, Serialize)]
pub struct PatientHistory {
    pub name: String,
    pub appointments: Vec<PatientAppointmentView>,
}

/// PostgREST renders a to-one embed as an object, older setups as a one-element array.
fn one_or_none<'de, D>(deserializer: D) -> Result<Option<SessionRecord>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Embedded {
        One(SessionRecord),
        Many(Vec<SessionRecord>),
    }

    Ok(match Option::<Embedded>::deserialize(deserializer)? {
        Some(Embedded::One(record)) => Some(record),
        Some(Embedded::Many(records)) => records.into_iter().next(),
        None => None,
    })
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, Error)]
pub enum BookingError {
    #[error("Missing required fields: doctorId, patientName, patientEmail and date are required")]
    MissingFields,

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Doctor not found")]
    DoctorNotFound,

    #[error("No available time slots for this date")]
    NoAvailability,

    #[error("Database error: {0}")]
    DatabaseError(String),
}

#[derive(Debug, Error)]
pub enum AppointmentError {
    #[error("Appointment not found")]
    NotFound,

    #[error("No session record found")]
    SessionRecordNotFound,

    #[error("No records found for this phone number")]
    NoPatientRecords,

    #[error("{0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn appointment_json() -> serde_json::Value {
        json!({
            "id": Uuid::new_v4(),
            "doctor_id": Uuid::new_v4(),
            "time_slot_id": null,
            "patient_name": "Nimal Perera",
            "patient_email": "nimal@example.com",
            "patient_phone": null,
            "date": "2026-10-21",
            "time_slot": "09:00",
            "room": "Room 1",
            "notes": null,
            "paid": true,
            "status": "COMPLETED",
            "created_at": null
        })
    }

    fn session_json(appointment_id: &serde_json::Value) -> serde_json::Value {
        json!({
            "id": Uuid::new_v4(),
            "appointment_id": appointment_id,
            "duration": 45,
            "recorded_temp": null,
            "prescription": "Rest",
            "prediction": "Low stress",
            "probability": 0.21,
            "confidence": 0.9,
            "avg_heart_rate": 72.5,
            "avg_body_temp": null,
            "avg_speech_noise": null,
            "avg_movement": null,
            "avg_ecg_variability": null,
            "avg_facial_stress": null,
            "age": 31,
            "gender": "F",
            "province": "Western",
            "created_at": null
        })
    }

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!("completed".parse::<AppointmentStatus>().unwrap(), AppointmentStatus::Completed);
        assert_eq!(" CANCELLED ".parse::<AppointmentStatus>().unwrap(), AppointmentStatus::Cancelled);
        assert!("PENDING".parse::<AppointmentStatus>().is_err());
    }

    #[test]
    fn session_embed_accepts_object_array_or_null() {
        let mut row = appointment_json();
        let id = row["id"].clone();

        row["session_record"] = session_json(&id);
        let parsed: AppointmentWithSession = serde_json::from_value(row.clone()).unwrap();
        assert_eq!(parsed.session_record.unwrap().duration, 45);

        row["session_record"] = json!([session_json(&id)]);
        let parsed: AppointmentWithSession = serde_json::from_value(row.clone()).unwrap();
        assert!(parsed.session_record.is_some());

        row["session_record"] = json!(null);
        let parsed: AppointmentWithSession = serde_json::from_value(row.clone()).unwrap();
        assert!(parsed.session_record.is_none());

        row["session_record"] = json!([]);
        let parsed: AppointmentWithSession = serde_json::from_value(row).unwrap();
        assert!(parsed.session_record.is_none());
    }
}
