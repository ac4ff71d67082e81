pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{Doctor, DoctorError, SlotError, TimeSlot};
pub use services::{doctor::DoctorService, slots::SlotService};
