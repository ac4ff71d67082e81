pub mod message;
pub mod phone;
pub mod sms;

pub use message::booking_confirmation_message;
pub use phone::normalize_phone_number;
pub use sms::SmsDispatcher;
