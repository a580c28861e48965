pub mod health;
pub mod ui;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::services::ServeDir;

use crate::state::AppState;
use crate::upload::handlers;

pub fn build_router(state: AppState) -> Router {
    let max_upload_bytes = state.config.max_upload_bytes;
    let public_dir = ServeDir::new(&state.config.public_dir);

    Router::new()
        .route("/", get(ui::index_handler))
        .route("/health", get(health::health_handler))
        // Upload API
        .route(
            "/api/upload",
            post(handlers::handle_upload).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/api/uploads/*path", get(handlers::handle_get_upload))
        // Catalog images and other static assets
        .fallback_service(public_dir)
        .with_state(state)
}
