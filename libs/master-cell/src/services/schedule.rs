// libs/master-cell/src/services/schedule.rs
use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveTime, Utc};
use serde_json::{json, Value};
use tracing::{debug, warn};
use uuid::Uuid;

use shared_database::SupabaseClient;

use crate::models::{CreateScheduleRequest, ScheduleError, ScheduleSlot, TimeSlotInput};

/// How far ahead the public schedule view reaches when no date is given.
const DEFAULT_SCHEDULE_WINDOW_DAYS: i64 = 14;

pub struct ScheduleService {
    store: Arc<SupabaseClient>,
}

impl ScheduleService {
    pub fn new(store: Arc<SupabaseClient>) -> Self {
        Self { store }
    }

    /// Replace a master's open slots for one day. Slots already booked
    /// (`is_available = false`) are left untouched so a schedule rewrite can
    /// never orphan an existing appointment.
    pub async fn create_schedule(
        &self,
        master_id: Uuid,
        request: CreateScheduleRequest,
        auth_token: &str,
    ) -> Result<Vec<ScheduleSlot>, ScheduleError> {
        debug!("Creating schedule for master {} on {}", master_id, request.date);

        if request.time_slots.is_empty() {
            return Err(ScheduleError::ValidationError(
                "At least one time slot is required".to_string(),
            ));
        }
        for slot in &request.time_slots {
            validate_slot_times(slot)?;
        }

        // Drop the still-open slots for that day, keep the booked ones
        let delete_path = format!(
            "/rest/v1/master_schedules?master_id=eq.{}&date=eq.{}&is_available=eq.true",
            master_id,
            format_date(request.date)
        );
        self.store
            .delete(&delete_path, Some(auth_token))
            .await
            .map_err(|e| ScheduleError::DatabaseError(e.to_string()))?;

        let rows: Vec<Value> = request
            .time_slots
            .iter()
            .map(|slot| {
                json!({
                    "master_id": master_id,
                    "date": format_date(request.date),
                    "start_time": format_time(slot.start_time),
                    "end_time": format_time(slot.end_time),
                    "is_available": true
                })
            })
            .collect();

        let created = self
            .store
            .insert_returning("/rest/v1/master_schedules", Value::Array(rows), Some(auth_token))
            .await
            .map_err(|e| ScheduleError::DatabaseError(e.to_string()))?;

        parse_slots(created)
    }

    /// Slots for one date, or the coming two weeks when no date is given.
    pub async fn get_schedule(
        &self,
        master_id: Uuid,
        date: Option<NaiveDate>,
        auth_token: Option<&str>,
    ) -> Result<Vec<ScheduleSlot>, ScheduleError> {
        let path = match date {
            Some(date) => format!(
                "/rest/v1/master_schedules?master_id=eq.{}&date=eq.{}&order=date.asc,start_time.asc",
                master_id,
                format_date(date)
            ),
            None => {
                let today = Utc::now().date_naive();
                let horizon = today + Duration::days(DEFAULT_SCHEDULE_WINDOW_DAYS);
                format!(
                    "/rest/v1/master_schedules?master_id=eq.{}&date=gte.{}&date=lte.{}&order=date.asc,start_time.asc",
                    master_id,
                    format_date(today),
                    format_date(horizon)
                )
            }
        };

        let rows = self
            .store
            .select(&path, auth_token)
            .await
            .map_err(|e| ScheduleError::DatabaseError(e.to_string()))?;

        parse_slots(rows)
    }

    /// Atomically claim the slot at (master, date, start_time): flip
    /// `is_available` from true to false only if it is currently true, and
    /// report whether the flip happened. The conditional filter makes this
    /// the serialization point for concurrent bookings of the same slot —
    /// at most one caller observes `true`.
    pub async fn claim_slot(
        &self,
        master_id: Uuid,
        date: NaiveDate,
        start_time: NaiveTime,
        auth_token: &str,
    ) -> Result<bool, ScheduleError> {
        let path = format!(
            "/rest/v1/master_schedules?master_id=eq.{}&date=eq.{}&start_time=eq.{}&is_available=eq.true",
            master_id,
            format_date(date),
            urlencoding::encode(&format_time(start_time))
        );

        let updated = self
            .store
            .update_returning(&path, json!({ "is_available": false }), Some(auth_token))
            .await
            .map_err(|e| ScheduleError::DatabaseError(e.to_string()))?;

        let claimed = !updated.is_empty();
        if !claimed {
            debug!(
                "Slot claim missed for master {} at {} {}",
                master_id, date, start_time
            );
        }
        Ok(claimed)
    }

    /// Release the slot at (master, date, start_time). If no matching slot
    /// row exists (the day was rescheduled since booking), the release is a
    /// no-op rather than an error.
    pub async fn release_slot(
        &self,
        master_id: Uuid,
        date: NaiveDate,
        start_time: NaiveTime,
        auth_token: &str,
    ) -> Result<(), ScheduleError> {
        let path = format!(
            "/rest/v1/master_schedules?master_id=eq.{}&date=eq.{}&start_time=eq.{}",
            master_id,
            format_date(date),
            urlencoding::encode(&format_time(start_time))
        );

        let updated = self
            .store
            .update_returning(&path, json!({ "is_available": true }), Some(auth_token))
            .await
            .map_err(|e| ScheduleError::DatabaseError(e.to_string()))?;

        if updated.is_empty() {
            warn!(
                "No schedule slot to release for master {} at {} {}",
                master_id, date, start_time
            );
        }
        Ok(())
    }
}

fn validate_slot_times(slot: &TimeSlotInput) -> Result<(), ScheduleError> {
    if slot.start_time >= slot.end_time {
        return Err(ScheduleError::ValidationError(
            "Slot start time must be before its end time".to_string(),
        ));
    }
    Ok(())
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn format_time(time: NaiveTime) -> String {
    time.format("%H:%M:%S").to_string()
}

fn parse_slots(rows: Vec<Value>) -> Result<Vec<ScheduleSlot>, ScheduleError> {
    rows.into_iter()
        .map(serde_json::from_value)
        .collect::<Result<Vec<ScheduleSlot>, _>>()
        .map_err(|e| ScheduleError::DatabaseError(format!("Failed to parse schedule slots: {}", e)))
}
