pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{Appointment, AppointmentStatus, BookingError};
pub use services::{AppointmentBookingService, AppointmentService};
