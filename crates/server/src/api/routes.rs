use axum::{
    middleware,
    routing::{delete, get, patch, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::{handlers, middleware as api_middleware, sessions, ws};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Static catalogues
        .route("/categories", get(handlers::list_categories))
        .route("/licenses", get(handlers::list_licenses))
        // Sessions
        .route("/sessions", post(sessions::create_session))
        .route("/sessions/{id}", get(sessions::get_session))
        .route("/sessions/{id}", delete(sessions::delete_session))
        .route("/sessions/{id}/files", post(sessions::add_files))
        .route("/sessions/{id}/entries", delete(sessions::clear_entries))
        .route("/sessions/{id}/entries/{entry_id}", patch(sessions::patch_entry))
        .route("/sessions/{id}/entries/{entry_id}", delete(sessions::remove_entry))
        .route("/sessions/{id}/submit", post(sessions::submit));

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/ws", get(ws::ws_handler))
        .route("/metrics", get(handlers::get_metrics))
        .layer(middleware::from_fn(api_middleware::metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
