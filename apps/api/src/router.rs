use std::sync::Arc;

use axum::{routing::get, Router};

use appointment_cell::router::appointment_routes;
use auth_cell::router::auth_routes;
use client_cell::router::client_routes;
use master_cell::router::master_routes;
use service_cell::router::service_routes;
use shared_database::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(|| async { "Barbershop API is running!" }))
        .nest("/api/auth", auth_routes(state.clone()))
        .nest("/api/services", service_routes(state.clone()))
        .nest("/api/clients", client_routes(state.clone()))
        .nest("/api/masters", master_routes(state.clone()))
        .nest("/api/appointments", appointment_routes(state.clone()))
}
