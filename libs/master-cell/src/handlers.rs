// libs/master-cell/src/handlers.rs
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
    CreateMasterRequest, CreateScheduleRequest, MasterError, ScheduleError,
    UpdateMasterRequest, UpdateMasterServicesRequest,
};
use crate::services::master::MasterService;
use crate::services::schedule::ScheduleService;

#[derive(Debug, Deserialize)]
pub struct ScheduleQuery {
    pub date: Option<NaiveDate>,
}

fn map_master_error(e: MasterError) -> AppError {
    match e {
        MasterError::NotFound => AppError::NotFound("Master not found".to_string()),
        MasterError::EmailTaken => AppError::Conflict("A user with this email already exists".to_string()),
        MasterError::ValidationError(msg) => AppError::ValidationError(msg),
        MasterError::DatabaseError(msg) => AppError::Database(msg),
    }
}

fn map_schedule_error(e: ScheduleError) -> AppError {
    match e {
        ScheduleError::ValidationError(msg) => AppError::ValidationError(msg),
        ScheduleError::DatabaseError(msg) => AppError::Database(msg),
    }
}

fn require_admin(user: &User) -> Result<(), AppError> {
    if user.role.as_deref() != Some("admin") {
        return Err(AppError::Forbidden("Administrator role required".to_string()));
    }
    Ok(())
}

fn require_master(user: &User) -> Result<(), AppError> {
    if !matches!(user.role.as_deref(), Some("master") | Some("admin")) {
        return Err(AppError::Forbidden("Master role required".to_string()));
    }
    Ok(())
}

/// Public: the master roster with offered service names.
#[axum::debug_handler]
pub async fn list_masters(State(state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    let masters = MasterService::new(state.store.clone())
        .list_masters(None)
        .await
        .map_err(map_master_error)?;

    Ok(Json(json!({ "masters": masters })))
}

#[axum::debug_handler]
pub async fn get_master(
    State(state): State<Arc<AppState>>,
    Path(master_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    let master = MasterService::new(state.store.clone())
        .get_master(master_id, auth.token())
        .await
        .map_err(map_master_error)?;

    Ok(Json(json!(master)))
}

#[axum::debug_handler]
pub async fn create_master(
    State(state): State<Arc<AppState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateMasterRequest>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    let master = MasterService::new(state.store.clone())
        .create_master(request, auth.token())
        .await
        .map_err(map_master_error)?;

    Ok(Json(json!({
        "master": master,
        "message": "Master created successfully"
    })))
}

#[axum::debug_handler]
pub async fn update_master(
    State(state): State<Arc<AppState>>,
    Path(master_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<UpdateMasterRequest>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    let master = MasterService::new(state.store.clone())
        .update_master(master_id, request, auth.token())
        .await
        .map_err(map_master_error)?;

    Ok(Json(json!({
        "master": master,
        "message": "Master updated successfully"
    })))
}

#[axum::debug_handler]
pub async fn delete_master(
    State(state): State<Arc<AppState>>,
    Path(master_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    MasterService::new(state.store.clone())
        .delete_master(master_id, auth.token())
        .await
        .map_err(map_master_error)?;

    Ok(Json(json!({ "message": "Master deleted successfully" })))
}

/// Public: a master's open and booked slots, one date or the next two weeks.
#[axum::debug_handler]
pub async fn get_master_schedule(
    State(state): State<Arc<AppState>>,
    Path(master_id): Path<Uuid>,
    Query(params): Query<ScheduleQuery>,
) -> Result<Json<Value>, AppError> {
    let schedule = ScheduleService::new(state.store.clone())
        .get_schedule(master_id, params.date, None)
        .await
        .map_err(map_schedule_error)?;

    Ok(Json(json!({ "schedule": schedule })))
}

/// Master self-service: replace the open slots for one day. Booked slots
/// survive the rewrite.
#[axum::debug_handler]
pub async fn create_schedule(
    State(state): State<Arc<AppState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateScheduleRequest>,
) -> Result<Json<Value>, AppError> {
    require_master(&user)?;

    let master_id = Uuid::parse_str(&user.id)
        .map_err(|_| AppError::BadRequest("Invalid master ID".to_string()))?;

    let slots = ScheduleService::new(state.store.clone())
        .create_schedule(master_id, request, auth.token())
        .await
        .map_err(map_schedule_error)?;

    Ok(Json(json!({
        "schedule": slots,
        "message": "Schedule created successfully"
    })))
}

/// Public: active services a master offers.
#[axum::debug_handler]
pub async fn get_master_services(
    State(state): State<Arc<AppState>>,
    Path(master_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let services = MasterService::new(state.store.clone())
        .get_master_services(master_id, None)
        .await
        .map_err(map_master_error)?;

    Ok(Json(json!({ "services": services })))
}

#[axum::debug_handler]
pub async fn update_master_services(
    State(state): State<Arc<AppState>>,
    Path(master_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<UpdateMasterServicesRequest>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    MasterService::new(state.store.clone())
        .set_master_services(master_id, request.service_ids, auth.token())
        .await
        .map_err(map_master_error)?;

    Ok(Json(json!({ "message": "Master services updated successfully" })))
}

/// A master's own thirty-day dashboard.
#[axum::debug_handler]
pub async fn get_my_stats(
    State(state): State<Arc<AppState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_master(&user)?;

    let master_id = Uuid::parse_str(&user.id)
        .map_err(|_| AppError::BadRequest("Invalid master ID".to_string()))?;

    let (stats, today_appointments) = MasterService::new(state.store.clone())
        .get_master_stats(master_id, auth.token())
        .await
        .map_err(map_master_error)?;

    Ok(Json(json!({
        "stats": stats,
        "today_appointments": today_appointments
    })))
}
