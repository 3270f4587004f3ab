// libs/client-cell/src/handlers.rs
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

use crate::models::{ClientError, CreateClientRequest, UpdateClientRequest};
use crate::services::directory::ClientDirectoryService;

fn map_client_error(e: ClientError) -> AppError {
    match e {
        ClientError::NotFound => AppError::NotFound("Client not found".to_string()),
        ClientError::EmailTaken => AppError::Conflict("A user with this email already exists".to_string()),
        ClientError::HasActiveAppointments => AppError::BadRequest(
            "Cannot delete a client with scheduled appointments. Cancel them first.".to_string(),
        ),
        ClientError::ValidationError(msg) => AppError::ValidationError(msg),
        ClientError::DatabaseError(msg) => AppError::Database(msg),
    }
}

fn require_admin(user: &User) -> Result<(), AppError> {
    if user.role.as_deref() != Some("admin") {
        return Err(AppError::Forbidden("Administrator role required".to_string()));
    }
    Ok(())
}

#[axum::debug_handler]
pub async fn list_clients(
    State(state): State<Arc<AppState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    let directory = ClientDirectoryService::new(state.store.clone());
    let clients = directory
        .list_clients(auth.token())
        .await
        .map_err(map_client_error)?;

    Ok(Json(json!({ "clients": clients })))
}

#[axum::debug_handler]
pub async fn get_client(
    State(state): State<Arc<AppState>>,
    Path(client_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    let directory = ClientDirectoryService::new(state.store.clone());
    let client = directory
        .get_client(client_id, auth.token())
        .await
        .map_err(map_client_error)?;

    Ok(Json(json!(client)))
}

#[axum::debug_handler]
pub async fn create_client(
    State(state): State<Arc<AppState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateClientRequest>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    let directory = ClientDirectoryService::new(state.store.clone());
    let client = directory
        .create_client(request, auth.token())
        .await
        .map_err(map_client_error)?;

    Ok(Json(json!({
        "client": client,
        "message": "Client created successfully"
    })))
}

#[axum::debug_handler]
pub async fn update_client(
    State(state): State<Arc<AppState>>,
    Path(client_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<UpdateClientRequest>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    let directory = ClientDirectoryService::new(state.store.clone());
    let client = directory
        .update_client(client_id, request, auth.token())
        .await
        .map_err(map_client_error)?;

    Ok(Json(json!({
        "client": client,
        "message": "Client updated successfully"
    })))
}

#[axum::debug_handler]
pub async fn delete_client(
    State(state): State<Arc<AppState>>,
    Path(client_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    let directory = ClientDirectoryService::new(state.store.clone());
    directory
        .delete_client(client_id, auth.token())
        .await
        .map_err(map_client_error)?;

    Ok(Json(json!({ "message": "Client deleted successfully" })))
}

/// A client's own booking counters.
#[axum::debug_handler]
pub async fn get_my_stats(
    State(state): State<Arc<AppState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let client_id = Uuid::parse_str(&user.id)
        .map_err(|_| AppError::BadRequest("Invalid client ID".to_string()))?;

    let directory = ClientDirectoryService::new(state.store.clone());
    let stats = directory
        .get_client_stats(client_id, auth.token())
        .await
        .map_err(map_client_error)?;

    Ok(Json(json!({ "stats": stats })))
}
