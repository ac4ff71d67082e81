use std::collections::HashMap;

use chrono::NaiveDate;
use reqwest::Method;
use serde_json::{json, Map, Value};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use security_cell::{CredentialError, CredentialService, LoginUser, NewLoginUser};
use shared_database::{AppState, SupabaseClient};
use shared_models::auth::ROLE_DOCTOR;

use crate::models::{
    AdminDoctorRow, AdminDoctorView, CreateDoctorRequest, Doctor, DoctorError, DoctorWithSlots,
    UpdateDoctorRequest,
};

const DEFAULT_EXPERIENCE: i32 = 5;
const DEFAULT_CONSULT_FEE: i32 = 2500;
const DEFAULT_RATING: f32 = 4.5;

impl From<CredentialError> for DoctorError {
    fn from(e: CredentialError) -> Self {
        match e {
            CredentialError::EmailInUse => DoctorError::EmailInUse,
            CredentialError::MissingFields => DoctorError::ValidationError(e.to_string()),
            CredentialError::NoLinkedUser => DoctorError::NotFound,
            CredentialError::Hashing(msg) | CredentialError::Database(msg) => DoctorError::DatabaseError(msg),
        }
    }
}

pub struct DoctorService {
    supabase: SupabaseClient,
    credentials: CredentialService,
}

impl DoctorService {
    pub fn new(state: &AppState) -> Self {
        Self {
            supabase: state.supabase.clone(),
            credentials: CredentialService::new(state),
        }
    }

    /// Public listing: available doctors, best rated first, each with the
    /// unbooked slots dated `today` or later.
    pub async fn list_available_doctors(&self, today: NaiveDate) -> Result<Vec<DoctorWithSlots>, DoctorError> {
        let path = format!(
            "/rest/v1/doctors?available=eq.true\
             &select=*,time_slots(*)\
             &time_slots.is_booked=eq.false\
             &time_slots.date=gte.{}\
             &time_slots.order=date.asc,time.asc\
             &order=rating.desc.nullslast",
            today.format("%Y-%m-%d")
        );

        let doctors: Vec<DoctorWithSlots> = self
            .supabase
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| DoctorError::DatabaseError(e.to_string()))?;

        debug!("Listing {} available doctors", doctors.len());
        Ok(doctors)
    }

    pub async fn get_doctor(&self, doctor_id: Uuid) -> Result<Doctor, DoctorError> {
        let path = format!("/rest/v1/doctors?id=eq.{}", doctor_id);

        let doctors: Vec<Doctor> = self
            .supabase
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| DoctorError::DatabaseError(e.to_string()))?;

        doctors.into_iter().next().ok_or(DoctorError::NotFound)
    }

    pub async fn list_doctors_admin(&self) -> Result<Vec<AdminDoctorView>, DoctorError> {
        let path = "/rest/v1/doctors?select=*,time_slots(*),available_dates(*),appointments(count)\
                    &time_slots.order=date.asc,time.asc\
                    &order=created_at.desc";

        let rows: Vec<AdminDoctorRow> = self
            .supabase
            .request(Method::GET, path, None)
            .await
            .map_err(|e| DoctorError::DatabaseError(e.to_string()))?;

        let doctor_ids: Vec<Uuid> = rows.iter().map(|r| r.doctor.id).collect();
        let emails: HashMap<Uuid, String> = self
            .credentials
            .users_for_doctors(&doctor_ids)
            .await?
            .into_iter()
            .filter_map(|u| u.doctor_id.map(|id| (id, u.email)))
            .collect();

        Ok(rows
            .into_iter()
            .map(|row| {
                let user_email = emails.get(&row.doctor.id).cloned();
                AdminDoctorView {
                    appointment_count: row.appointments.first().map(|c| c.count).unwrap_or(0),
                    doctor: row.doctor,
                    time_slots: row.time_slots,
                    available_dates: row.available_dates,
                    user_email,
                }
            })
            .collect())
    }

    /// Creates the doctor row and its login account. If the account cannot be
    /// created the doctor row is removed again.
    pub async fn create_doctor(&self, request: CreateDoctorRequest) -> Result<(Doctor, LoginUser), DoctorError> {
        let required = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        let (Some(name), Some(specialty), Some(email), Some(password)) = (
            required(request.name),
            required(request.specialty),
            required(request.email),
            request.password.filter(|p| !p.is_empty()),
        ) else {
            return Err(DoctorError::ValidationError(
                "Name, specialty, email and password are required".to_string(),
            ));
        };

        if self.credentials.find_user_by_email(&email).await?.is_some() {
            return Err(DoctorError::EmailInUse);
        }

        let doctor_data = json!({
            "name": name,
            "specialty": specialty,
            "bio": request.bio,
            "experience": request.experience.unwrap_or(DEFAULT_EXPERIENCE),
            "consult_fee": request.consult_fee.unwrap_or(DEFAULT_CONSULT_FEE),
            "rating": request.rating.unwrap_or(DEFAULT_RATING),
            "available": true,
        });

        let created: Vec<Doctor> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/doctors",
                Some(doctor_data),
                Some(SupabaseClient::representation_headers()),
            )
            .await
            .map_err(|e| DoctorError::DatabaseError(e.to_string()))?;

        let doctor = created
            .into_iter()
            .next()
            .ok_or_else(|| DoctorError::DatabaseError("Failed to create doctor".to_string()))?;

        let new_user = NewLoginUser {
            email,
            name: doctor.name.clone(),
            password,
            role: ROLE_DOCTOR.to_string(),
            doctor_id: Some(doctor.id),
        };

        match self.credentials.create_login_user(new_user).await {
            Ok(user) => {
                info!("Doctor {} created with login {}", doctor.id, user.email);
                Ok((doctor, user))
            }
            Err(e) => {
                error!("Login account for doctor {} failed, removing doctor: {}", doctor.id, e);
                if let Err(cleanup) = self.delete_doctor_row(doctor.id).await {
                    warn!("Could not remove doctor {} after failed signup: {}", doctor.id, cleanup);
                }
                Err(e.into())
            }
        }
    }

    pub async fn update_doctor(&self, request: UpdateDoctorRequest) -> Result<Doctor, DoctorError> {
        let doctor_id = request
            .id
            .ok_or_else(|| DoctorError::ValidationError("Doctor ID is required".to_string()))?;

        let mut update_data = Map::new();
        if let Some(name) = request.name {
            update_data.insert("name".to_string(), json!(name));
        }
        if let Some(specialty) = request.specialty {
            update_data.insert("specialty".to_string(), json!(specialty));
        }
        if let Some(bio) = request.bio {
            update_data.insert("bio".to_string(), json!(bio));
        }
        if let Some(experience) = request.experience {
            update_data.insert("experience".to_string(), json!(experience));
        }
        if let Some(fee) = request.consult_fee {
            update_data.insert("consult_fee".to_string(), json!(fee));
        }
        if let Some(rating) = request.rating {
            update_data.insert("rating".to_string(), json!(rating));
        }
        if let Some(available) = request.available {
            update_data.insert("available".to_string(), json!(available));
        }
        if let Some(days) = request.available_days {
            update_data.insert("available_days".to_string(), json!(days));
        }
        if let Some(time) = request.available_time {
            update_data.insert("available_time".to_string(), json!(time));
        }

        if update_data.is_empty() {
            return Err(DoctorError::ValidationError("No fields to update".to_string()));
        }

        let path = format!("/rest/v1/doctors?id=eq.{}", doctor_id);
        let updated: Vec<Doctor> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(Value::Object(update_data)),
                Some(SupabaseClient::representation_headers()),
            )
            .await
            .map_err(|e| DoctorError::DatabaseError(e.to_string()))?;

        updated.into_iter().next().ok_or(DoctorError::NotFound)
    }

    /// Removes the doctor's login account, then the doctor. Slots, dates and
    /// appointments go with the doctor row.
    pub async fn delete_doctor(&self, doctor_id: Uuid) -> Result<(), DoctorError> {
        let removed_users = self.credentials.delete_users_for_doctor(doctor_id).await?;

        if !self.delete_doctor_row(doctor_id).await? {
            return Err(DoctorError::NotFound);
        }

        info!("Deleted doctor {} and {} login account(s)", doctor_id, removed_users);
        Ok(())
    }

    async fn delete_doctor_row(&self, doctor_id: Uuid) -> Result<bool, DoctorError> {
        let path = format!("/rest/v1/doctors?id=eq.{}&select=id", doctor_id);
        let deleted: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::DELETE,
                &path,
                None,
                Some(SupabaseClient::representation_headers()),
            )
            .await
            .map_err(|e| DoctorError::DatabaseError(e.to_string()))?;

        Ok(!deleted.is_empty())
    }
}
