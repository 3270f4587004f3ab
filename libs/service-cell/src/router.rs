// libs/service-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};

use shared_database::AppState;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn service_routes(state: Arc<AppState>) -> Router {
    // Catalog browsing is public; mutation is admin-only behind auth
    let public_routes = Router::new()
        .route("/", get(handlers::list_services))
        .route("/{service_id}", get(handlers::get_service))
        .route("/{service_id}/masters", get(handlers::get_service_masters));

    let protected_routes = Router::new()
        .route("/", post(handlers::create_service))
        .route("/{service_id}", put(handlers::update_service))
        .route("/{service_id}", delete(handlers::delete_service))
        .route("/admin/all", get(handlers::list_all_services))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
