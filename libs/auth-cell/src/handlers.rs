// libs/auth-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, State},
    http::HeaderMap,
    Json,
};
use axum_extra::TypedHeader;
use chrono::Utc;
use headers::{authorization::Bearer, Authorization};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use shared_database::AppState;
use shared_models::auth::{TokenResponse, User};
use shared_models::error::AppError;
use shared_utils::jwt::validate_token;

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
}

// Helper function to extract token
fn extract_bearer_token(headers: &HeaderMap) -> Result<String, AppError> {
    let auth_header = headers
        .get("Authorization")
        .ok_or_else(|| AppError::Auth("Missing authorization header".to_string()))?;

    let auth_value = auth_header
        .to_str()
        .map_err(|_| AppError::Auth("Invalid authorization header format".to_string()))?;

    if !auth_value.starts_with("Bearer ") {
        return Err(AppError::Auth("Invalid authorization header format".to_string()));
    }

    Ok(auth_value[7..].to_string())
}

pub async fn validate(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<TokenResponse>, AppError> {
    debug!("Validating token");

    let token = extract_bearer_token(&headers)?;

    match validate_token(&token, &state.config.supabase_jwt_secret) {
        Ok(user) => {
            let response = TokenResponse {
                valid: true,
                user_id: user.id,
                email: user.email,
                role: user.role,
            };

            Ok(Json(response))
        }
        Err(err) => Err(AppError::Auth(err)),
    }
}

pub async fn verify(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Value>, AppError> {
    debug!("Verifying token");

    let token = extract_bearer_token(&headers)?;

    match validate_token(&token, &state.config.supabase_jwt_secret) {
        Ok(_) => Ok(Json(json!({ "valid": true }))),
        Err(_) => Ok(Json(json!({ "valid": false }))),
    }
}

/// The caller's own users row.
#[axum::debug_handler]
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    debug!("Getting profile for user: {}", user.id);

    let path = format!(
        "/rest/v1/users?id=eq.{}&select=id,email,first_name,last_name,phone,role,avatar_url,created_at",
        user.id
    );
    let rows = state
        .store
        .select(&path, Some(auth.token()))
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    let profile = rows
        .into_iter()
        .next()
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(json!({ "user": profile })))
}

#[axum::debug_handler]
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<Value>, AppError> {
    debug!("Updating profile for user: {}", user.id);

    let mut update_data = serde_json::Map::new();
    if let Some(first_name) = request.first_name {
        update_data.insert("first_name".to_string(), json!(first_name));
    }
    if let Some(last_name) = request.last_name {
        update_data.insert("last_name".to_string(), json!(last_name));
    }
    if let Some(phone) = request.phone {
        update_data.insert("phone".to_string(), json!(phone));
    }

    if update_data.is_empty() {
        return Err(AppError::ValidationError("No fields to update".to_string()));
    }

    update_data.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

    let path = format!("/rest/v1/users?id=eq.{}", user.id);
    let rows = state
        .store
        .update_returning(&path, Value::Object(update_data), Some(auth.token()))
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    let profile = rows
        .into_iter()
        .next()
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(json!({
        "user": profile,
        "message": "Profile updated successfully"
    })))
}
