use reqwest::{header::ACCEPT, Client};
use tracing::{debug, error, info, warn};

use shared_database::AppState;

use crate::models::{BookingConfirmation, NotificationError, SmsApiResponse, SmsPayload};
use crate::services::message::booking_confirmation_message;
use crate::services::phone::normalize_phone_number;

/// Client for the outbound SMS gateway.
///
/// Every failure is soft: callers get `false` and the cause is logged.
pub struct SmsDispatcher {
    client: Client,
    api_url: String,
    api_token: String,
    sender_id: String,
    country_prefix: String,
    clinic_name: String,
    configured: bool,
}

impl SmsDispatcher {
    pub fn new(state: &AppState) -> Self {
        let config = &state.config;
        Self {
            client: state.http.clone(),
            api_url: config.sms_api_url.clone(),
            api_token: config.sms_api_token.clone(),
            sender_id: config.sms_sender_id.clone(),
            country_prefix: config.sms_country_prefix.clone(),
            clinic_name: config.clinic_name.clone(),
            configured: config.is_sms_configured(),
        }
    }

    pub async fn send_booking_confirmation(&self, phone: &str, confirmation: &BookingConfirmation) -> bool {
        let message = booking_confirmation_message(&self.clinic_name, confirmation);
        self.send(phone, &message).await
    }

    pub async fn send(&self, recipient: &str, message: &str) -> bool {
        match self.try_send(recipient, message).await {
            Ok(()) => true,
            Err(NotificationError::NotConfigured) => {
                warn!("SMS gateway not configured, skipping message");
                false
            }
            Err(e) => {
                error!("SMS delivery failed: {}", e);
                false
            }
        }
    }

    async fn try_send(&self, recipient: &str, message: &str) -> Result<(), NotificationError> {
        if !self.configured {
            return Err(NotificationError::NotConfigured);
        }

        if !recipient.chars().any(|c| c.is_ascii_digit()) {
            return Err(NotificationError::InvalidRecipient(recipient.to_string()));
        }

        let payload = SmsPayload {
            recipient: normalize_phone_number(recipient, &self.country_prefix),
            sender_id: self.sender_id.clone(),
            message_type: "plain".to_string(),
            message: message.to_string(),
        };

        info!("Sending SMS to {}", payload.recipient);

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_token)
            .header(ACCEPT, "application/json")
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        let response_text = response.text().await?;

        debug!("SMS gateway response: {} - {}", status, response_text);

        if !status.is_success() {
            return Err(NotificationError::HttpStatus {
                status: status.as_u16(),
                body: response_text,
            });
        }

        let api_response: SmsApiResponse = serde_json::from_str(&response_text)
            .map_err(|e| NotificationError::Rejected(format!("Unreadable gateway response: {}", e)))?;

        if !api_response.is_success() {
            return Err(NotificationError::Rejected(
                api_response.message.unwrap_or_else(|| "unknown error".to_string()),
            ));
        }

        Ok(())
    }
}
