use std::env;
use tracing::warn;

pub const DEFAULT_SMS_API_URL: &str = "https://app.text.lk/api/v3/sms/send";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_service_key: String,
    pub supabase_jwt_secret: String,
    pub sms_api_url: String,
    pub sms_api_token: String,
    pub sms_sender_id: String,
    pub sms_country_prefix: String,
    pub clinic_name: String,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, using empty value");
                    String::new()
                }),
            supabase_service_key: env::var("SUPABASE_SERVICE_ROLE_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_SERVICE_ROLE_KEY not set, using empty value");
                    String::new()
                }),
            supabase_jwt_secret: env::var("SUPABASE_JWT_SECRET")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_JWT_SECRET not set, using empty value");
                    String::new()
                }),
            sms_api_url: env::var("SMS_API_URL")
                .unwrap_or_else(|_| {
                    warn!("SMS_API_URL not set, using default");
                    DEFAULT_SMS_API_URL.to_string()
                }),
            sms_api_token: env::var("SMS_API_TOKEN")
                .unwrap_or_else(|_| {
                    warn!("SMS_API_TOKEN not set, booking confirmations will not be sent");
                    String::new()
                }),
            sms_sender_id: env::var("SMS_SENDER_ID")
                .unwrap_or_else(|_| "TextLKDemo".to_string()),
            sms_country_prefix: env::var("SMS_COUNTRY_PREFIX")
                .unwrap_or_else(|_| "94".to_string()),
            clinic_name: env::var("CLINIC_NAME")
                .unwrap_or_else(|_| "MindGuard".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| match p.parse() {
                    Ok(port) => Some(port),
                    Err(_) => {
                        warn!("PORT is not a valid port number: {}", p);
                        None
                    }
                })
                .unwrap_or(3000),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty()
            && !self.supabase_service_key.is_empty()
            && !self.supabase_jwt_secret.is_empty()
    }

    pub fn is_sms_configured(&self) -> bool {
        !self.sms_api_url.is_empty()
            && !self.sms_api_token.is_empty()
            && !self.sms_sender_id.is_empty()
    }
}
