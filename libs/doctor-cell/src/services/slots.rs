use anyhow::Result;
use chrono::{Duration, NaiveDate, NaiveTime, Timelike};
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Method,
};
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_database::{AppState, SupabaseClient};

use crate::models::{CreateSlotsRequest, DeleteSlotsRequest, SlotDeletion, SlotError, TimeSlot};

pub const DEFAULT_ROOM: &str = "Room 1";
const MINUTES_PER_DAY: u64 = 24 * 60;

/// Accepts `YYYY-MM-DD` or an ISO datetime; only the calendar day is kept.
pub fn parse_calendar_date(raw: &str) -> Result<NaiveDate, SlotError> {
    let day = raw.trim().split('T').next().unwrap_or_default();
    NaiveDate::parse_from_str(day, "%Y-%m-%d").map_err(|_| SlotError::InvalidDate(raw.to_string()))
}

pub fn parse_start_time(raw: &str) -> Result<NaiveTime, SlotError> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M")
        .map_err(|_| SlotError::InvalidStartTime(raw.to_string()))
}

/// Time labels for `count` consecutive slots of `duration_minutes` each.
///
/// Arithmetic is done on a 24h clock, so a session running past midnight
/// wraps to `00:00` onward instead of spilling into the next date.
pub fn generate_slot_times(start: NaiveTime, count: u32, duration_minutes: u32) -> Vec<String> {
    (0..count)
        .map(|i| {
            let offset = Duration::minutes(i64::from(i) * i64::from(duration_minutes));
            let (time, _) = start.overflowing_add_signed(offset);
            time.format("%H:%M").to_string()
        })
        .collect()
}

pub fn wraps_past_midnight(start: NaiveTime, count: u32, duration_minutes: u32) -> bool {
    if count == 0 {
        return false;
    }
    let start_minutes = u64::from(start.num_seconds_from_midnight() / 60);
    start_minutes + u64::from(count - 1) * u64::from(duration_minutes) >= MINUTES_PER_DAY
}

pub struct SlotService {
    supabase: SupabaseClient,
}

impl SlotService {
    pub fn new(state: &AppState) -> Self {
        Self {
            supabase: state.supabase.clone(),
        }
    }

    pub async fn list_slots(&self, doctor_id: Uuid) -> Result<Vec<TimeSlot>, SlotError> {
        let path = format!(
            "/rest/v1/time_slots?doctor_id=eq.{}&order=date.asc,time.asc",
            doctor_id
        );

        self.supabase
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| SlotError::Database(e.to_string()))
    }

    /// Bulk-creates a session of slots. Returns how many rows were added;
    /// slots that already exist for the same doctor/date/time are skipped.
    pub async fn create_session(&self, doctor_id: Uuid, request: CreateSlotsRequest) -> Result<usize, SlotError> {
        let date = parse_calendar_date(request.date.as_deref().ok_or(SlotError::MissingField("date"))?)?;
        let start = parse_start_time(request.start_time.as_deref().ok_or(SlotError::MissingField("startTime"))?)?;
        let count = request.count.ok_or(SlotError::MissingField("count"))?;
        let duration = request.duration.ok_or(SlotError::MissingField("duration"))?;

        if count == 0 {
            return Err(SlotError::NotPositive("count"));
        }
        if duration == 0 || u64::from(duration) >= MINUTES_PER_DAY {
            return Err(SlotError::InvalidDuration(duration));
        }
        if u64::from(count) * u64::from(duration) > MINUTES_PER_DAY {
            return Err(SlotError::SessionTooLong { count, duration });
        }

        self.ensure_doctor_exists(doctor_id).await?;

        if wraps_past_midnight(start, count, duration) {
            warn!(
                "Session for doctor {} on {} starting {} ({} x {} min) runs past midnight; labels wrap to 00:00",
                doctor_id, date, start.format("%H:%M"), count, duration
            );
        }

        let room = request
            .room
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| DEFAULT_ROOM.to_string());
        let date_label = date.format("%Y-%m-%d").to_string();

        let rows: Vec<Value> = generate_slot_times(start, count, duration)
            .into_iter()
            .map(|time| {
                json!({
                    "doctor_id": doctor_id,
                    "date": date_label,
                    "time": time,
                    "room": room,
                    "is_booked": false
                })
            })
            .collect();

        let mut headers = HeaderMap::new();
        headers.insert(
            "Prefer",
            HeaderValue::from_static("resolution=ignore-duplicates,return=representation"),
        );

        let inserted: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/time_slots?on_conflict=doctor_id,date,time&select=id",
                Some(Value::Array(rows)),
                Some(headers),
            )
            .await
            .map_err(|e| SlotError::Database(e.to_string()))?;

        info!(
            "Added {} of {} slots for doctor {} on {}",
            inserted.len(), count, doctor_id, date
        );
        Ok(inserted.len())
    }

    /// Deletes every slot of a date when `date` is given, otherwise the single `slot_id`.
    /// Appointments holding a deleted slot are cancelled first.
    pub async fn delete_slots(&self, doctor_id: Uuid, request: DeleteSlotsRequest) -> Result<SlotDeletion, SlotError> {
        if let Some(raw_date) = request.date.as_deref().filter(|d| !d.trim().is_empty()) {
            let date = parse_calendar_date(raw_date)?;
            let scope = format!("doctor_id=eq.{}&date=eq.{}", doctor_id, date.format("%Y-%m-%d"));

            let booked: Vec<TimeSlot> = self
                .supabase
                .request(Method::GET, &format!("/rest/v1/time_slots?{}&is_booked=eq.true", scope), None)
                .await
                .map_err(|e| SlotError::Database(e.to_string()))?;
            let booked_ids: Vec<Uuid> = booked.iter().map(|s| s.id).collect();
            let cancelled_appointments = self.cancel_appointments_for_slots(&booked_ids).await?;

            let deleted = self.delete_where(&scope).await?;
            info!("Deleted {} slots for doctor {} on {}", deleted, doctor_id, date);

            return Ok(SlotDeletion { deleted, cancelled_appointments });
        }

        let slot_id = request.slot_id.ok_or(SlotError::MissingSelector)?;

        let path = format!("/rest/v1/time_slots?id=eq.{}&doctor_id=eq.{}", slot_id, doctor_id);
        let existing: Vec<TimeSlot> = self
            .supabase
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| SlotError::Database(e.to_string()))?;
        let slot = existing.into_iter().next().ok_or(SlotError::SlotNotFound)?;

        let cancelled_appointments = if slot.is_booked {
            self.cancel_appointments_for_slots(&[slot.id]).await?
        } else {
            0
        };

        let deleted = self.delete_where(&format!("id=eq.{}", slot.id)).await?;
        debug!("Deleted slot {} ({} {})", slot.id, slot.date, slot.time);

        Ok(SlotDeletion { deleted, cancelled_appointments })
    }

    /// Earliest unbooked slot of the doctor on `date`, by time label.
    pub async fn next_unbooked_slot(&self, doctor_id: Uuid, date: NaiveDate) -> Result<Option<TimeSlot>> {
        let path = format!(
            "/rest/v1/time_slots?doctor_id=eq.{}&date=eq.{}&is_booked=eq.false&order=time.asc&limit=1",
            doctor_id,
            date.format("%Y-%m-%d")
        );

        let slots: Vec<TimeSlot> = self.supabase.request(Method::GET, &path, None).await?;
        Ok(slots.into_iter().next())
    }

    async fn ensure_doctor_exists(&self, doctor_id: Uuid) -> Result<(), SlotError> {
        let path = format!("/rest/v1/doctors?id=eq.{}&select=id", doctor_id);
        let found: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| SlotError::Database(e.to_string()))?;

        if found.is_empty() {
            return Err(SlotError::DoctorNotFound);
        }
        Ok(())
    }

    async fn cancel_appointments_for_slots(&self, slot_ids: &[Uuid]) -> Result<usize, SlotError> {
        if slot_ids.is_empty() {
            return Ok(0);
        }

        let ids = slot_ids.iter().map(Uuid::to_string).collect::<Vec<_>>().join(",");
        let path = format!(
            "/rest/v1/appointments?time_slot_id=in.({})&status=neq.CANCELLED&select=id",
            ids
        );

        let cancelled: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(json!({ "status": "CANCELLED" })),
                Some(SupabaseClient::representation_headers()),
            )
            .await
            .map_err(|e| SlotError::Database(e.to_string()))?;

        if !cancelled.is_empty() {
            info!("Cancelled {} appointments whose slots were removed", cancelled.len());
        }
        Ok(cancelled.len())
    }

    async fn delete_where(&self, filter: &str) -> Result<usize, SlotError> {
        let path = format!("/rest/v1/time_slots?{}&select=id", filter);
        let deleted: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::DELETE,
                &path,
                None,
                Some(SupabaseClient::representation_headers()),
            )
            .await
            .map_err(|e| SlotError::Database(e.to_string()))?;

        Ok(deleted.len())
    }
}
