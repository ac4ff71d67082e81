// =====================================================================================
// SECURITY CELL MODELS
// =====================================================================================

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Login account row. The password hash is never deserialized into this type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginUser {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub role: String,
    pub doctor_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResetCredentialsRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

impl ResetCredentialsRequest {
    /// Blank strings count as absent.
    pub fn normalized(self) -> (Option<String>, Option<String>) {
        let email = self.email.map(|e| e.trim().to_string()).filter(|e| !e.is_empty());
        let password = self.password.filter(|p| !p.is_empty());
        (email, password)
    }
}

#[derive(Debug, Clone)]
pub struct NewLoginUser {
    pub email: String,
    pub name: String,
    pub password: String,
    pub role: String,
    pub doctor_id: Option<Uuid>,
}

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("Email or password is required")]
    MissingFields,

    #[error("No login account found for this doctor")]
    NoLinkedUser,

    #[error("Email already in use by another account")]
    EmailInUse,

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<argon2::password_hash::Error> for CredentialError {
    fn from(e: argon2::password_hash::Error) -> Self {
        CredentialError::Hashing(e.to_string())
    }
}
