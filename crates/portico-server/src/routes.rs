//! Route definitions.

use crate::handlers;
use crate::state::AppState;
use axum::{Router, routing::get};

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(handlers::healthz))
        .route(
            "/system/service",
            get(handlers::list_services).post(handlers::create_services),
        )
        .route(
            "/system/service/{id}",
            get(handlers::get_service).delete(handlers::delete_service),
        )
        .route("/{service}", get(handlers::service_root))
        .route("/{service}/{*resource}", get(handlers::service_resource))
        .with_state(state)
}
