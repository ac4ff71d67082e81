// =====================================================================================
// STAFF LOGIN ACCOUNTS
// =====================================================================================

use reqwest::Method;
use serde_json::{json, Map, Value};
use tracing::{debug, info};
use uuid::Uuid;

use shared_database::{AppState, PostgrestError, SupabaseClient};

use crate::models::{CredentialError, LoginUser, NewLoginUser, ResetCredentialsRequest};
use crate::services::password::PasswordSecurityService;

const USER_COLUMNS: &str = "select=id,email,name,role,doctor_id";

/// A write can still race another account onto the same email; the unique
/// index answers 409 and that is reported like the pre-check would.
fn write_error(e: anyhow::Error) -> CredentialError {
    if PostgrestError::is_conflict(&e) {
        CredentialError::EmailInUse
    } else {
        CredentialError::Database(e.to_string())
    }
}

pub struct CredentialService {
    supabase: SupabaseClient,
}

impl CredentialService {
    pub fn new(state: &AppState) -> Self {
        Self {
            supabase: state.supabase.clone(),
        }
    }

    /// Replaces the login email and/or password of the account linked to a doctor.
    /// Returns the email the account uses afterwards.
    pub async fn reset_doctor_credentials(
        &self,
        doctor_id: Uuid,
        request: ResetCredentialsRequest,
    ) -> Result<String, CredentialError> {
        let (email, password) = request.normalized();
        if email.is_none() && password.is_none() {
            return Err(CredentialError::MissingFields);
        }

        let user = self
            .find_user_for_doctor(doctor_id)
            .await?
            .ok_or(CredentialError::NoLinkedUser)?;

        if let Some(new_email) = email.as_deref() {
            if new_email != user.email && self.find_user_by_email(new_email).await?.is_some() {
                return Err(CredentialError::EmailInUse);
            }
        }

        let mut update_data = Map::new();
        if let Some(new_email) = &email {
            update_data.insert("email".to_string(), json!(new_email));
        }
        if let Some(new_password) = &password {
            let hash = PasswordSecurityService::hash_password(new_password)?;
            update_data.insert("password_hash".to_string(), json!(hash));
        }

        let path = format!("/rest/v1/users?id=eq.{}&{}", user.id, USER_COLUMNS);
        let updated: Vec<LoginUser> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(Value::Object(update_data)),
                Some(SupabaseClient::representation_headers()),
            )
            .await
            .map_err(write_error)?;

        let updated = updated
            .into_iter()
            .next()
            .ok_or_else(|| CredentialError::Database("Login account vanished during update".to_string()))?;

        info!("Credentials reset for doctor {} (user {})", doctor_id, updated.id);
        Ok(updated.email)
    }

    pub async fn find_user_for_doctor(&self, doctor_id: Uuid) -> Result<Option<LoginUser>, CredentialError> {
        let path = format!("/rest/v1/users?doctor_id=eq.{}&{}&limit=1", doctor_id, USER_COLUMNS);
        self.first_user(&path).await
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<LoginUser>, CredentialError> {
        let path = format!(
            "/rest/v1/users?email=eq.{}&{}&limit=1",
            urlencoding::encode(email),
            USER_COLUMNS
        );
        self.first_user(&path).await
    }

    /// Login accounts linked to any of the given doctors.
    pub async fn users_for_doctors(&self, doctor_ids: &[Uuid]) -> Result<Vec<LoginUser>, CredentialError> {
        if doctor_ids.is_empty() {
            return Ok(Vec::new());
        }

        let ids = doctor_ids.iter().map(Uuid::to_string).collect::<Vec<_>>().join(",");
        let path = format!("/rest/v1/users?doctor_id=in.({})&{}", ids, USER_COLUMNS);

        self.supabase
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| CredentialError::Database(e.to_string()))
    }

    pub async fn create_login_user(&self, new_user: NewLoginUser) -> Result<LoginUser, CredentialError> {
        if self.find_user_by_email(&new_user.email).await?.is_some() {
            return Err(CredentialError::EmailInUse);
        }

        let password_hash = PasswordSecurityService::hash_password(&new_user.password)?;

        let user_data = json!({
            "email": new_user.email,
            "name": new_user.name,
            "password_hash": password_hash,
            "role": new_user.role,
            "doctor_id": new_user.doctor_id,
        });

        let path = format!("/rest/v1/users?{}", USER_COLUMNS);
        let created: Vec<LoginUser> = self
            .supabase
            .request_with_headers(
                Method::POST,
                &path,
                Some(user_data),
                Some(SupabaseClient::representation_headers()),
            )
            .await
            .map_err(write_error)?;

        let user = created
            .into_iter()
            .next()
            .ok_or_else(|| CredentialError::Database("Failed to create login account".to_string()))?;

        debug!("Login account {} created for {}", user.id, user.email);
        Ok(user)
    }

    pub async fn delete_users_for_doctor(&self, doctor_id: Uuid) -> Result<usize, CredentialError> {
        let path = format!("/rest/v1/users?doctor_id=eq.{}&select=id", doctor_id);
        let deleted: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::DELETE,
                &path,
                None,
                Some(SupabaseClient::representation_headers()),
            )
            .await
            .map_err(|e| CredentialError::Database(e.to_string()))?;

        Ok(deleted.len())
    }

    async fn first_user(&self, path: &str) -> Result<Option<LoginUser>, CredentialError> {
        let users: Vec<LoginUser> = self
            .supabase
            .request(Method::GET, path, None)
            .await
            .map_err(|e| CredentialError::Database(e.to_string()))?;

        Ok(users.into_iter().next())
    }
}
