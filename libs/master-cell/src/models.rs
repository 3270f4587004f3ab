// libs/master-cell/src/models.rs
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Master {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
    /// Names of the services this master offers, aggregated from the
    /// master_services link table.
    #[serde(default)]
    pub services: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMasterRequest {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateMasterRequest {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateMasterServicesRequest {
    pub service_ids: Vec<Uuid>,
}

/// One bookable unit of a master's day. Natural key is
/// (master_id, date, start_time); `is_available` is flipped by the booking
/// workflow when the slot is claimed or released.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleSlot {
    pub id: Uuid,
    pub master_id: Uuid,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub is_available: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSlotInput {
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateScheduleRequest {
    pub date: NaiveDate,
    pub time_slots: Vec<TimeSlotInput>,
}

/// Thirty-day performance counters for the master dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MasterStats {
    pub total_appointments: i64,
    pub completed_appointments: i64,
    pub cancelled_appointments: i64,
    pub total_earnings: f64,
    pub avg_appointment_price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TodayAppointment {
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub status: String,
    pub service_name: Option<String>,
    pub client_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MasterServiceEntry {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub duration_minutes: i32,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum MasterError {
    #[error("Master not found")]
    NotFound,

    #[error("A user with this email already exists")]
    EmailTaken,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum ScheduleError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl ScheduleSlot {
    pub fn slot_key(&self) -> (Uuid, NaiveDate, NaiveTime) {
        (self.master_id, self.date, self.start_time)
    }
}
