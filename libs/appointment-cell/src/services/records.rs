use reqwest::Method;
use serde_json::{json, Map, Value};
use tracing::{info, warn};
use uuid::Uuid;

use shared_database::{AppState, SupabaseClient};

use crate::models::{
    Appointment, AppointmentError, AppointmentStatus, AppointmentWithDoctor, AppointmentWithSession,
    PatientAppointmentView, PatientHistory, PatientRecordRow, SessionRecord, SubmitSessionResultRequest,
    UpdateAppointmentRequest,
};

const WITH_DOCTOR: &str = "select=*,doctor:doctors(*)";
const WITH_SESSION: &str = "select=*,session_record:session_records(*)";

pub struct AppointmentService {
    supabase: SupabaseClient,
}

impl AppointmentService {
    pub fn new(state: &AppState) -> Self {
        Self {
            supabase: state.supabase.clone(),
        }
    }

    pub async fn list_all(&self) -> Result<Vec<AppointmentWithDoctor>, AppointmentError> {
        let path = format!("/rest/v1/appointments?{}&order=created_at.desc", WITH_DOCTOR);
        self.fetch(&path).await
    }

    pub async fn get_appointment(&self, appointment_id: Uuid) -> Result<Appointment, AppointmentError> {
        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let rows: Vec<Appointment> = self.fetch(&path).await?;
        rows.into_iter().next().ok_or(AppointmentError::NotFound)
    }

    /// Admin edit of `paid` and/or `status`. Status changes never touch the slot.
    pub async fn update_appointment(&self, request: UpdateAppointmentRequest) -> Result<AppointmentWithDoctor, AppointmentError> {
        let appointment_id = request
            .id
            .ok_or_else(|| AppointmentError::ValidationError("Appointment ID is required".to_string()))?;

        let mut update_data = Map::new();
        if let Some(paid) = request.paid {
            update_data.insert("paid".to_string(), json!(paid));
        }
        if let Some(status) = request.status.as_deref() {
            let status: AppointmentStatus = status.parse()?;
            update_data.insert("status".to_string(), json!(status));
        }

        if update_data.is_empty() {
            return Err(AppointmentError::ValidationError("Nothing to update: provide paid or status".to_string()));
        }

        let path = format!("/rest/v1/appointments?id=eq.{}&{}", appointment_id, WITH_DOCTOR);
        let updated: Vec<AppointmentWithDoctor> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(Value::Object(update_data)),
                Some(SupabaseClient::representation_headers()),
            )
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        let updated = updated.into_iter().next().ok_or(AppointmentError::NotFound)?;
        info!(
            "Appointment {} updated: status {}, paid {}",
            updated.appointment.id, updated.appointment.status, updated.appointment.paid
        );
        Ok(updated)
    }

    /// Paid, confirmed or completed appointments of a doctor, oldest date first.
    pub async fn doctor_patients(&self, doctor_id: Uuid) -> Result<Vec<AppointmentWithSession>, AppointmentError> {
        let path = format!(
            "/rest/v1/appointments?doctor_id=eq.{}&status=in.({},{})&paid=eq.true&{}&order=date.asc",
            doctor_id,
            AppointmentStatus::Confirmed,
            AppointmentStatus::Completed,
            WITH_SESSION
        );
        self.fetch(&path).await
    }

    /// History for a phone number, grouped by patient name in order of first
    /// appearance. Appointments that already carry a session record but were
    /// never marked completed are corrected on the way.
    pub async fn patient_records(&self, phone: &str) -> Result<Vec<PatientHistory>, AppointmentError> {
        let path = format!(
            "/rest/v1/appointments?patient_phone=eq.{}\
             &select=*,doctor:doctors(name,specialty),session_record:session_records(*)\
             &order=date.desc",
            urlencoding::encode(phone)
        );

        let mut rows: Vec<PatientRecordRow> = self.fetch(&path).await?;
        if rows.is_empty() {
            return Err(AppointmentError::NoPatientRecords);
        }

        let stale: Vec<Uuid> = rows
            .iter()
            .filter(|r| r.session_record.is_some() && r.appointment.status != AppointmentStatus::Completed)
            .map(|r| r.appointment.id)
            .collect();

        if !stale.is_empty() {
            self.mark_completed(&stale).await?;
            for row in rows.iter_mut().filter(|r| stale.contains(&r.appointment.id)) {
                row.appointment.status = AppointmentStatus::Completed;
            }
        }

        Ok(group_by_patient(rows))
    }

    /// Stores the session record and completes the appointment. A failed
    /// status update is left for the patient-records pass to correct.
    pub async fn record_session(
        &self,
        appointment: &Appointment,
        request: SubmitSessionResultRequest,
    ) -> Result<SessionRecord, AppointmentError> {
        let averages = request.session_averages.unwrap_or_default();
        let record_data = json!({
            "appointment_id": appointment.id,
            "duration": request.duration.unwrap_or(0),
            "recorded_temp": request.recorded_temp,
            "prescription": request.prescription.filter(|p| !p.is_empty()),
            "prediction": request.prediction.filter(|p| !p.is_empty()),
            "probability": request.probability,
            "confidence": request.confidence,
            "avg_heart_rate": averages.heart_rate,
            "avg_body_temp": averages.body_temp,
            "avg_speech_noise": averages.speech_noise_db,
            "avg_movement": averages.movement_level,
            "avg_ecg_variability": averages.ecg_variability,
            "avg_facial_stress": averages.facial_stress_score,
            "age": averages.age,
            "gender": averages.gender,
            "province": averages.province,
        });

        let created: Vec<SessionRecord> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/session_records",
                Some(record_data),
                Some(SupabaseClient::representation_headers()),
            )
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        let record = created
            .into_iter()
            .next()
            .ok_or_else(|| AppointmentError::DatabaseError("Session record insert returned no row".to_string()))?;

        if let Err(e) = self.mark_completed(&[appointment.id]).await {
            warn!("Session {} saved but appointment {} not completed: {}", record.id, appointment.id, e);
        }

        info!("Session results recorded for appointment {}", appointment.id);
        Ok(record)
    }

    pub async fn session_record(&self, appointment_id: Uuid) -> Result<SessionRecord, AppointmentError> {
        let path = format!("/rest/v1/session_records?appointment_id=eq.{}", appointment_id);
        let rows: Vec<SessionRecord> = self.fetch(&path).await?;
        rows.into_iter().next().ok_or(AppointmentError::SessionRecordNotFound)
    }

    async fn mark_completed(&self, appointment_ids: &[Uuid]) -> Result<(), AppointmentError> {
        let ids = appointment_ids.iter().map(Uuid::to_string).collect::<Vec<_>>().join(",");
        let path = format!("/rest/v1/appointments?id=in.({})&select=id", ids);

        let _: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(json!({ "status": AppointmentStatus::Completed })),
                Some(SupabaseClient::representation_headers()),
            )
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        Ok(())
    }

    async fn fetch<T>(&self, path: &str) -> Result<Vec<T>, AppointmentError>
    where
        T: serde::de::DeserializeOwned,
    {
        self.supabase
            .request(Method::GET, path, None)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))
    }
}

fn group_by_patient(rows: Vec<PatientRecordRow>) -> Vec<PatientHistory> {
    let mut patients: Vec<PatientHistory> = Vec::new();

    for row in rows {
        let name = row.appointment.patient_name.clone();
        let view = PatientAppointmentView::from(row);

        match patients.iter_mut().find(|p| p.name == name) {
            Some(patient) => patient.appointments.push(view),
            None => patients.push(PatientHistory {
                name,
                appointments: vec![view],
            }),
        }
    }

    patients
}
