// libs/service-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_database::AppState;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{CatalogError, CreateServiceRequest, UpdateServiceRequest};
use crate::services::catalog::CatalogService;

fn map_catalog_error(e: CatalogError) -> AppError {
    match e {
        CatalogError::NotFound => AppError::NotFound("Service not found".to_string()),
        CatalogError::ValidationError(msg) => AppError::ValidationError(msg),
        CatalogError::DatabaseError(msg) => AppError::Database(msg),
    }
}

fn require_admin(user: &User) -> Result<(), AppError> {
    if user.role.as_deref() != Some("admin") {
        return Err(AppError::Forbidden("Administrator role required".to_string()));
    }
    Ok(())
}

/// Public: active services for the booking page.
#[axum::debug_handler]
pub async fn list_services(State(state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    let catalog = CatalogService::new(state.store.clone());

    let services = catalog
        .list_active_services(None)
        .await
        .map_err(map_catalog_error)?;

    Ok(Json(json!({ "services": services })))
}

/// Public: a single service by id, active or not.
#[axum::debug_handler]
pub async fn get_service(
    State(state): State<Arc<AppState>>,
    Path(service_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let catalog = CatalogService::new(state.store.clone());

    let service = catalog
        .get_service(service_id, None)
        .await
        .map_err(map_catalog_error)?;

    Ok(Json(json!(service)))
}

/// Public: masters offering a service.
#[axum::debug_handler]
pub async fn get_service_masters(
    State(state): State<Arc<AppState>>,
    Path(service_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let catalog = CatalogService::new(state.store.clone());

    let masters = catalog
        .get_service_masters(service_id, None)
        .await
        .map_err(map_catalog_error)?;

    Ok(Json(json!({ "masters": masters })))
}

#[axum::debug_handler]
pub async fn create_service(
    State(state): State<Arc<AppState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateServiceRequest>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    let catalog = CatalogService::new(state.store.clone());
    let service = catalog
        .create_service(request, Some(auth.token()))
        .await
        .map_err(map_catalog_error)?;

    Ok(Json(json!({
        "service": service,
        "message": "Service created successfully"
    })))
}

#[axum::debug_handler]
pub async fn update_service(
    State(state): State<Arc<AppState>>,
    Path(service_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<UpdateServiceRequest>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    let catalog = CatalogService::new(state.store.clone());
    let service = catalog
        .update_service(service_id, request, Some(auth.token()))
        .await
        .map_err(map_catalog_error)?;

    Ok(Json(json!({
        "service": service,
        "message": "Service updated successfully"
    })))
}

/// Soft delete: deactivates the service rather than removing the row.
#[axum::debug_handler]
pub async fn delete_service(
    State(state): State<Arc<AppState>>,
    Path(service_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    let catalog = CatalogService::new(state.store.clone());
    catalog
        .deactivate_service(service_id, Some(auth.token()))
        .await
        .map_err(map_catalog_error)?;

    Ok(Json(json!({ "message": "Service deactivated successfully" })))
}

/// Admin: full catalog including deactivated services.
#[axum::debug_handler]
pub async fn list_all_services(
    State(state): State<Arc<AppState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    let catalog = CatalogService::new(state.store.clone());
    let services = catalog
        .list_all_services(Some(auth.token()))
        .await
        .map_err(map_catalog_error)?;

    Ok(Json(json!({ "services": services })))
}
