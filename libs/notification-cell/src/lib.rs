pub mod models;
pub mod services;

pub use models::{BookingConfirmation, NotificationError};
pub use services::{SmsDispatcher, normalize_phone_number};
