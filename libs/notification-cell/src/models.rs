use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Body accepted by the SMS gateway's send endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct SmsPayload {
    pub recipient: String,
    pub sender_id: String,
    #[serde(rename = "type")]
    pub message_type: String,
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmsApiResponse {
    pub status: Option<String>,
    pub message: Option<String>,
}

impl SmsApiResponse {
    pub fn is_success(&self) -> bool {
        self.status.as_deref() == Some("success")
    }
}

/// Everything the booking confirmation text needs.
#[derive(Debug, Clone)]
pub struct BookingConfirmation {
    pub appointment_id: Uuid,
    pub patient_name: String,
    pub doctor_name: String,
    pub date: NaiveDate,
    pub time: String,
    pub room: String,
    pub consult_fee: Option<i32>,
    pub queue_position: usize,
}

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("SMS gateway is not configured")]
    NotConfigured,

    #[error("Recipient has no digits: {0:?}")]
    InvalidRecipient(String),

    #[error("SMS transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("SMS gateway returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("SMS gateway rejected message: {0}")]
    Rejected(String),
}
