use chrono::NaiveDate;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use doctor_cell::services::slots::parse_calendar_date;
use doctor_cell::{DoctorError, DoctorService, SlotService, TimeSlot};
use notification_cell::{BookingConfirmation, SmsDispatcher};
use shared_database::{AppState, SupabaseClient};

use crate::models::{
    Appointment, AppointmentStatus, BookAppointmentRequest, BookingError, BookingOutcome, NewBooking,
};

/// Upper bound on re-selecting after losing a slot to a concurrent booking.
pub const MAX_CLAIM_ATTEMPTS: usize = 8;

impl BookAppointmentRequest {
    pub fn validate(self) -> Result<NewBooking, BookingError> {
        let present = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());

        let (Some(doctor_id), Some(patient_name), Some(patient_email), Some(date)) = (
            present(self.doctor_id),
            present(self.patient_name),
            present(self.patient_email),
            present(self.date),
        ) else {
            return Err(BookingError::MissingFields);
        };

        // An id that is not a uuid cannot name an existing doctor.
        let doctor_id = Uuid::parse_str(&doctor_id).map_err(|_| BookingError::DoctorNotFound)?;
        let date = parse_calendar_date(&date).map_err(|_| BookingError::InvalidDate(date))?;

        Ok(NewBooking {
            doctor_id,
            patient_name,
            patient_email,
            patient_phone: present(self.patient_phone),
            date,
            notes: present(self.notes),
        })
    }
}

pub struct AppointmentBookingService {
    supabase: SupabaseClient,
    doctors: DoctorService,
    slots: SlotService,
    sms: SmsDispatcher,
}

impl AppointmentBookingService {
    pub fn new(state: &AppState) -> Self {
        Self {
            supabase: state.supabase.clone(),
            doctors: DoctorService::new(state),
            slots: SlotService::new(state),
            sms: SmsDispatcher::new(state),
        }
    }

    /// Books the earliest free slot of a doctor on a date.
    ///
    /// Each candidate slot is claimed and its appointment written by the
    /// `book_time_slot` database function, which runs as one transaction: a
    /// failed insert leaves the slot unbooked, and a slot taken concurrently
    /// yields no row so the next earliest one is tried.
    pub async fn book_appointment(&self, request: BookAppointmentRequest) -> Result<BookingOutcome, BookingError> {
        let booking = request.validate()?;

        let doctor = self.doctors.get_doctor(booking.doctor_id).await.map_err(|e| match e {
            DoctorError::NotFound => BookingError::DoctorNotFound,
            other => BookingError::DatabaseError(other.to_string()),
        })?;

        let (slot, appointment) = self.book_earliest_slot(&booking).await?;

        let queue_position = self.queue_position(doctor.id, booking.date).await?;

        info!(
            "Booked appointment {} with doctor {} on {} at {} (queue #{})",
            appointment.id, doctor.id, appointment.date, appointment.time_slot, queue_position
        );

        let sms_sent = match booking.patient_phone.as_deref() {
            Some(phone) => {
                let confirmation = BookingConfirmation {
                    appointment_id: appointment.id,
                    patient_name: appointment.patient_name.clone(),
                    doctor_name: doctor.name.clone(),
                    date: appointment.date,
                    time: appointment.time_slot.clone(),
                    room: slot.room.clone(),
                    consult_fee: doctor.consult_fee,
                    queue_position,
                };
                self.sms.send_booking_confirmation(phone, &confirmation).await
            }
            None => false,
        };

        Ok(BookingOutcome {
            appointment,
            doctor,
            queue_position,
            sms_sent,
        })
    }

    async fn book_earliest_slot(&self, booking: &NewBooking) -> Result<(TimeSlot, Appointment), BookingError> {
        for attempt in 1..=MAX_CLAIM_ATTEMPTS {
            let candidate = self
                .slots
                .next_unbooked_slot(booking.doctor_id, booking.date)
                .await
                .map_err(|e| BookingError::DatabaseError(e.to_string()))?
                .ok_or(BookingError::NoAvailability)?;

            if let Some(appointment) = self.book_slot(booking, candidate.id).await? {
                return Ok((candidate, appointment));
            }

            debug!(
                "Slot {} taken concurrently, re-selecting (attempt {}/{})",
                candidate.id, attempt, MAX_CLAIM_ATTEMPTS
            );
        }

        warn!(
            "Gave up booking a slot for doctor {} on {} after {} attempts",
            booking.doctor_id, booking.date, MAX_CLAIM_ATTEMPTS
        );
        Err(BookingError::NoAvailability)
    }

    /// `None` when the slot was no longer free.
    async fn book_slot(&self, booking: &NewBooking, slot_id: Uuid) -> Result<Option<Appointment>, BookingError> {
        let params = json!({
            "p_slot_id": slot_id,
            "p_doctor_id": booking.doctor_id,
            "p_patient_name": booking.patient_name,
            "p_patient_email": booking.patient_email,
            "p_patient_phone": booking.patient_phone,
            "p_notes": booking.notes
        });

        let created: Vec<Appointment> = self
            .supabase
            .request(Method::POST, "/rest/v1/rpc/book_time_slot", Some(params))
            .await
            .map_err(|e| {
                error!("Booking slot {} failed: {}", slot_id, e);
                BookingError::DatabaseError(e.to_string())
            })?;

        Ok(created.into_iter().next())
    }

    /// Number of non-cancelled appointments the doctor has on the date.
    pub async fn queue_position(&self, doctor_id: Uuid, date: NaiveDate) -> Result<usize, BookingError> {
        let path = format!(
            "/rest/v1/appointments?doctor_id=eq.{}&date=eq.{}&status=neq.{}&select=id",
            doctor_id,
            date.format("%Y-%m-%d"),
            AppointmentStatus::Cancelled
        );

        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| BookingError::DatabaseError(e.to_string()))?;

        Ok(rows.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn request() -> BookAppointmentRequest {
        BookAppointmentRequest {
            doctor_id: Some(Uuid::new_v4().to_string()),
            patient_name: Some(" Nimal Perera ".to_string()),
            patient_email: Some("nimal@example.com".to_string()),
            patient_phone: Some("".to_string()),
            date: Some("2026-10-21T00:00:00.000Z".to_string()),
            notes: None,
        }
    }

    #[test]
    fn validation_trims_and_keeps_only_the_calendar_day() {
        let booking = request().validate().unwrap();
        assert_eq!(booking.patient_name, "Nimal Perera");
        assert_eq!(booking.date, NaiveDate::from_ymd_opt(2026, 10, 21).unwrap());
        assert!(booking.patient_phone.is_none());
    }

    #[test]
    fn missing_fields_are_rejected() {
        let result = BookAppointmentRequest { patient_email: Some("  ".to_string()), ..request() }.validate();
        assert_matches!(result, Err(BookingError::MissingFields));

        let result = BookAppointmentRequest { date: None, ..request() }.validate();
        assert_matches!(result, Err(BookingError::MissingFields));
    }

    #[test]
    fn malformed_doctor_id_or_date_is_reported() {
        let result = BookAppointmentRequest { doctor_id: Some("doc-1".to_string()), ..request() }.validate();
        assert_matches!(result, Err(BookingError::DoctorNotFound));

        let result = BookAppointmentRequest { date: Some("21/10/2026".to_string()), ..request() }.validate();
        assert_matches!(result, Err(BookingError::InvalidDate(_)));
    }
}
