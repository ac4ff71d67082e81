use crate::models::BookingConfirmation;

/// Short human-readable booking reference: last six characters of the id, uppercased.
pub fn booking_reference(confirmation: &BookingConfirmation) -> String {
    let id = confirmation.appointment_id.simple().to_string();
    id[id.len() - 6..].to_uppercase()
}

/// `Rs. 3,500`, or `TBD` when the doctor has no fee set.
pub fn format_fee(fee: Option<i32>) -> String {
    match fee {
        Some(amount) if amount != 0 => {
            let digits = amount.unsigned_abs().to_string();
            let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
            for (i, ch) in digits.chars().enumerate() {
                if i > 0 && (digits.len() - i) % 3 == 0 {
                    grouped.push(',');
                }
                grouped.push(ch);
            }
            let sign = if amount < 0 { "-" } else { "" };
            format!("Rs. {}{}", sign, grouped)
        }
        _ => "TBD".to_string(),
    }
}

pub fn booking_confirmation_message(clinic_name: &str, confirmation: &BookingConfirmation) -> String {
    format!(
        "{clinic} Booking Confirmed!\n\
         Patient: {patient}\n\
         Ref: {reference} | Booking #{position}\n\
         Doctor: {doctor}\n\
         Date: {date}\n\
         Time: {time}\n\
         Room: {room}\n\
         Fee: {fee}\n\
         \n\
         Thank you for choosing {clinic}.",
        clinic = clinic_name,
        patient = confirmation.patient_name,
        reference = booking_reference(confirmation),
        position = confirmation.queue_position,
        doctor = confirmation.doctor_name,
        date = confirmation.date.format("%a, %b %-d"),
        time = confirmation.time,
        room = confirmation.room,
        fee = format_fee(confirmation.consult_fee),
    )
}
