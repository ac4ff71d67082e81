pub mod booking;
pub mod records;

pub use booking::AppointmentBookingService;
pub use records::AppointmentService;
