use std::sync::Arc;

use base64::{engine::general_purpose, Engine as _};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::AppState;
use shared_models::auth::User;

pub struct TestConfig {
    pub jwt_secret: String,
    pub supabase_url: String,
    pub supabase_service_key: String,
    pub sms_api_url: String,
    pub sms_api_token: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            supabase_url: "http://localhost:54321".to_string(),
            supabase_service_key: "test-service-key".to_string(),
            sms_api_url: String::new(),
            sms_api_token: String::new(),
        }
    }
}

impl TestConfig {
    /// Points the database client at a mock PostgREST server.
    pub fn with_supabase(uri: &str) -> Self {
        Self {
            supabase_url: uri.to_string(),
            ..Self::default()
        }
    }

    /// Enables SMS delivery against a mock gateway.
    pub fn sms(mut self, url: &str, token: &str) -> Self {
        self.sms_api_url = url.to_string();
        self.sms_api_token = token.to_string();
        self
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_service_key: self.supabase_service_key.clone(),
            supabase_jwt_secret: self.jwt_secret.clone(),
            sms_api_url: self.sms_api_url.clone(),
            sms_api_token: self.sms_api_token.clone(),
            sms_sender_id: "TextLKDemo".to_string(),
            sms_country_prefix: "94".to_string(),
            clinic_name: "MindGuard".to_string(),
            port: 3000,
        }
    }

    pub fn to_state(&self) -> Arc<AppState> {
        Arc::new(AppState::new(self.to_app_config()))
    }
}

pub struct TestUser {
    pub id: String,
    pub email: String,
    pub role: String,
    pub doctor_id: Option<String>,
}

impl TestUser {
    pub fn new(email: &str, role: &str, doctor_id: Option<&str>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            role: role.to_string(),
            doctor_id: doctor_id.map(str::to_string),
        }
    }

    pub fn doctor(email: &str, doctor_id: &str) -> Self {
        Self::new(email, "doctor", Some(doctor_id))
    }

    pub fn admin(email: &str) -> Self {
        Self::new(email, "admin", None)
    }

    pub fn to_user(&self) -> User {
        User {
            id: self.id.clone(),
            email: Some(self.email.clone()),
            role: Some(self.role.clone()),
            doctor_id: self.doctor_id.clone(),
            created_at: Some(Utc::now()),
        }
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    /// HS256 token for `user`, valid for `exp_hours` (negative means already expired).
    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        let issued = Utc::now();
        let claims = json!({
            "sub": user.id,
            "email": user.email,
            "role": user.role,
            "doctor_id": user.doctor_id,
            "iat": issued.timestamp(),
            "exp": (issued + Duration::hours(exp_hours.unwrap_or(24))).timestamp()
        });

        Self::sign(&json!({ "alg": "HS256", "typ": "JWT" }), &claims, secret)
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::create_test_token(user, secret, Some(-1))
    }

    pub fn create_invalid_signature_token(user: &TestUser) -> String {
        Self::create_test_token(user, "not-the-clinic-secret", Some(24))
    }

    pub fn create_malformed_token() -> String {
        "only.two".to_string()
    }

    fn sign(header: &serde_json::Value, claims: &serde_json::Value, secret: &str) -> String {
        let encode = |v: &serde_json::Value| general_purpose::URL_SAFE_NO_PAD.encode(v.to_string());
        let signed_part = format!("{}.{}", encode(header), encode(claims));

        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("hmac accepts any key length");
        mac.update(signed_part.as_bytes());

        format!(
            "{}.{}",
            signed_part,
            general_purpose::URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes())
        )
    }
}

/// Row shapes as PostgREST returns them.
pub struct MockSupabaseResponses;

impl MockSupabaseResponses {
    pub fn doctor_response(doctor_id: &str, name: &str, consult_fee: Option<i32>) -> serde_json::Value {
        json!({
            "id": doctor_id,
            "name": name,
            "specialty": "Psychiatrist",
            "bio": "Child and adolescent mental health",
            "experience": 12,
            "consult_fee": consult_fee,
            "rating": 4.9,
            "available": true,
            "available_days": "Mon,Tue,Wed,Thu,Fri",
            "available_time": "09:00-17:00",
            "created_at": "2026-01-01T00:00:00Z"
        })
    }

    pub fn slot_response(slot_id: &str, doctor_id: &str, date: &str, time: &str, is_booked: bool) -> serde_json::Value {
        json!({
            "id": slot_id,
            "doctor_id": doctor_id,
            "date": date,
            "time": time,
            "room": "Room 1",
            "is_booked": is_booked
        })
    }

    pub fn appointment_response(appointment_id: &str, doctor_id: &str, date: &str, time: &str) -> serde_json::Value {
        json!({
            "id": appointment_id,
            "doctor_id": doctor_id,
            "time_slot_id": null,
            "patient_name": "Nimal Perera",
            "patient_email": "nimal@example.com",
            "patient_phone": "0771234567",
            "date": date,
            "time_slot": time,
            "room": "Room 1",
            "notes": null,
            "paid": false,
            "status": "CONFIRMED",
            "created_at": "2026-01-01T08:00:00Z"
        })
    }

    pub fn user_response(user_id: &str, email: &str, doctor_id: Option<&str>) -> serde_json::Value {
        json!({
            "id": user_id,
            "email": email,
            "name": "Dr. Test",
            "role": if doctor_id.is_some() { "doctor" } else { "admin" },
            "doctor_id": doctor_id
        })
    }

    pub fn error_response(message: &str, code: &str) -> serde_json::Value {
        json!({
            "message": message,
            "code": code
        })
    }
}
