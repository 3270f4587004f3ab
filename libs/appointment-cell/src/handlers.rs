// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use chrono::NaiveDate;
use headers::{authorization::Bearer, Authorization};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_database::AppState;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{
    AppointmentError, BookAppointmentRequest, CompleteAppointmentRequest, UpdateAppointmentRequest,
};
use crate::services::booking::AppointmentBookingService;
use crate::services::policy::{self, Role};

#[derive(Debug, Deserialize)]
pub struct MasterAppointmentsQuery {
    pub date: Option<NaiveDate>,
}

fn map_appointment_error(e: AppointmentError) -> AppError {
    match e {
        AppointmentError::NotFound => AppError::NotFound("Appointment not found".to_string()),
        AppointmentError::ServiceNotFound => {
            AppError::NotFound("Service not found or inactive".to_string())
        }
        AppointmentError::SlotUnavailable => {
            AppError::BadRequest("Selected time is not available".to_string())
        }
        AppointmentError::Conflict => {
            AppError::Conflict("An appointment already exists for this time".to_string())
        }
        AppointmentError::Forbidden => {
            AppError::Forbidden("Not allowed to act on this appointment".to_string())
        }
        AppointmentError::InvalidStateTransition(status) => {
            AppError::BadRequest(format!("Cannot modify appointment in status: {}", status))
        }
        AppointmentError::InvalidTime(msg) => AppError::BadRequest(msg),
        AppointmentError::ValidationError(msg) => AppError::ValidationError(msg),
        AppointmentError::DatabaseError(msg) => AppError::Database(msg),
    }
}

fn caller_uuid(user: &User) -> Result<Uuid, AppError> {
    Uuid::parse_str(&user.id).map_err(|_| AppError::BadRequest("Invalid user ID".to_string()))
}

/// Book a slot for the authenticated caller.
#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<Arc<AppState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let client_id = caller_uuid(&user)?;

    let booking_service = AppointmentBookingService::new(state.store.clone());
    let appointment = booking_service
        .book_appointment(client_id, request, auth.token())
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "appointment": appointment,
        "message": "Appointment booked successfully"
    })))
}

/// The caller's own appointments as a client.
#[axum::debug_handler]
pub async fn get_client_appointments(
    State(state): State<Arc<AppState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let client_id = caller_uuid(&user)?;

    let booking_service = AppointmentBookingService::new(state.store.clone());
    let appointments = booking_service
        .list_for_client(client_id, auth.token())
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "appointments": appointments,
        "total": appointments.len()
    })))
}

/// The caller's own appointments as a master, optionally for one date.
#[axum::debug_handler]
pub async fn get_master_appointments(
    State(state): State<Arc<AppState>>,
    Query(params): Query<MasterAppointmentsQuery>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    if !matches!(user.role.as_deref(), Some("master") | Some("admin")) {
        return Err(AppError::Forbidden("Master role required".to_string()));
    }
    let master_id = caller_uuid(&user)?;

    let booking_service = AppointmentBookingService::new(state.store.clone());
    let appointments = booking_service
        .list_for_master(master_id, params.date, auth.token())
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "appointments": appointments,
        "total": appointments.len()
    })))
}

/// Admin overview of every appointment.
#[axum::debug_handler]
pub async fn get_all_appointments(
    State(state): State<Arc<AppState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    if !policy::can_administer(Role::from_user(&user)) {
        return Err(AppError::Forbidden("Administrator role required".to_string()));
    }

    let booking_service = AppointmentBookingService::new(state.store.clone());
    let appointments = booking_service
        .list_all(auth.token())
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "appointments": appointments,
        "total": appointments.len()
    })))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(state): State<Arc<AppState>>,
    Path(appointment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let booking_service = AppointmentBookingService::new(state.store.clone());

    let appointment = booking_service
        .get_appointment(appointment_id, auth.token())
        .await
        .map_err(map_appointment_error)?;

    if !policy::can_cancel(&user.id, Role::from_user(&user), &appointment) {
        return Err(AppError::Forbidden(
            "Not allowed to cancel this appointment".to_string(),
        ));
    }

    let cancelled = booking_service
        .cancel_appointment(&appointment, auth.token())
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "appointment": cancelled,
        "message": "Appointment cancelled successfully"
    })))
}

#[axum::debug_handler]
pub async fn complete_appointment(
    State(state): State<Arc<AppState>>,
    Path(appointment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<CompleteAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let booking_service = AppointmentBookingService::new(state.store.clone());

    let appointment = booking_service
        .get_appointment(appointment_id, auth.token())
        .await
        .map_err(map_appointment_error)?;

    if !policy::can_complete(&user.id, Role::from_user(&user), &appointment) {
        return Err(AppError::Forbidden(
            "Not allowed to complete this appointment".to_string(),
        ));
    }

    let completed = booking_service
        .complete_appointment(&appointment, request.notes, auth.token())
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "appointment": completed,
        "message": "Appointment completed successfully"
    })))
}

/// Administrative edit. A changed master, date or time is written without
/// another slot check - a deliberate override that can double-book.
#[axum::debug_handler]
pub async fn update_appointment(
    State(state): State<Arc<AppState>>,
    Path(appointment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<UpdateAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    if !policy::can_administer(Role::from_user(&user)) {
        return Err(AppError::Forbidden("Administrator role required".to_string()));
    }

    let booking_service = AppointmentBookingService::new(state.store.clone());
    let appointment = booking_service
        .update_appointment(appointment_id, request, auth.token())
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "appointment": appointment,
        "message": "Appointment updated successfully"
    })))
}

#[axum::debug_handler]
pub async fn delete_appointment(
    State(state): State<Arc<AppState>>,
    Path(appointment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    if !policy::can_administer(Role::from_user(&user)) {
        return Err(AppError::Forbidden("Administrator role required".to_string()));
    }

    let booking_service = AppointmentBookingService::new(state.store.clone());
    booking_service
        .delete_appointment(appointment_id, auth.token())
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({ "message": "Appointment deleted successfully" })))
}
