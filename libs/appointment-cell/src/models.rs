// libs/appointment-cell/src/models.rs
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

/// A confirmed booking binding a client, master, service and slot.
/// `total_price` and `end_time` are snapshots taken when the booking was
/// made; later catalog edits do not touch existing appointments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub client_id: Uuid,
    pub master_id: Uuid,
    pub service_id: Uuid,
    pub appointment_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub total_price: f64,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Appointment {
    /// The slot this appointment occupies in the master's schedule.
    pub fn slot_key(&self) -> (Uuid, NaiveDate, NaiveTime) {
        (self.master_id, self.appointment_date, self.start_time)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Scheduled,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    /// Completed and cancelled are terminal; nothing transitions out of them.
    pub fn is_terminal(&self) -> bool {
        matches!(self, AppointmentStatus::Completed | AppointmentStatus::Cancelled)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Scheduled => write!(f, "scheduled"),
            AppointmentStatus::Completed => write!(f, "completed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    pub master_id: Uuid,
    pub service_id: Uuid,
    pub appointment_date: NaiveDate,
    pub start_time: NaiveTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompleteAppointmentRequest {
    pub notes: Option<String>,
}

/// Administrative partial update. When the service changes, price and end
/// time are recomputed from the new service; a changed master, date or time
/// is written as-is without another slot check.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateAppointmentRequest {
    pub service_id: Option<Uuid>,
    pub master_id: Option<Uuid>,
    pub appointment_date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub status: Option<AppointmentStatus>,
    pub notes: Option<String>,
}

impl UpdateAppointmentRequest {
    pub fn is_empty(&self) -> bool {
        self.service_id.is_none()
            && self.master_id.is_none()
            && self.appointment_date.is_none()
            && self.start_time.is_none()
            && self.status.is_none()
            && self.notes.is_none()
    }
}

// ==============================================================================
// LISTING MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceRef {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonRef {
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
}

impl PersonRef {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// An appointment row enriched with the display fields each listing needs:
/// the service name plus the counterpart's name and phone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentListItem {
    #[serde(flatten)]
    pub appointment: Appointment,
    #[serde(default)]
    pub service: Option<ServiceRef>,
    #[serde(default)]
    pub master: Option<PersonRef>,
    #[serde(default)]
    pub client: Option<PersonRef>,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
pub enum AppointmentError {
    #[error("Appointment not found")]
    NotFound,

    #[error("Service not found or inactive")]
    ServiceNotFound,

    #[error("Selected time is not available")]
    SlotUnavailable,

    #[error("An appointment already exists for this time")]
    Conflict,

    #[error("Not allowed to act on this appointment")]
    Forbidden,

    #[error("Appointment cannot be modified in current status: {0}")]
    InvalidStateTransition(AppointmentStatus),

    #[error("Invalid appointment time: {0}")]
    InvalidTime(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}
