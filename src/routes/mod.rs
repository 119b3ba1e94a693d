mod api;
mod models;

pub use api::{download_certificate, health, verify_and_generate};
pub use models::{ApiResponse, SUCCESS_MESSAGE};

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/verify-and-generate", post(verify_and_generate))
        .route("/api/certificate", post(download_certificate))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
