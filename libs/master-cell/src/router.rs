// libs/master-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};

use shared_database::AppState;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn master_routes(state: Arc<AppState>) -> Router {
    // The roster, schedules and offered services are public booking-page data
    let public_routes = Router::new()
        .route("/", get(handlers::list_masters))
        .route("/{master_id}/schedule", get(handlers::get_master_schedule))
        .route("/{master_id}/services", get(handlers::get_master_services));

    let protected_routes = Router::new()
        .route("/", post(handlers::create_master))
        .route("/{master_id}", get(handlers::get_master))
        .route("/{master_id}", put(handlers::update_master))
        .route("/{master_id}", delete(handlers::delete_master))
        .route("/{master_id}/services", put(handlers::update_master_services))
        .route("/schedule", post(handlers::create_schedule))
        .route("/stats/me", get(handlers::get_my_stats))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
