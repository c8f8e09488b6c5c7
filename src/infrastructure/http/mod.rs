//! HTTP REST API routes

mod story_routes;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::infrastructure::state::AppState;

pub use story_routes::*;

/// Create all API routes
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/stories", post(story_routes::generate_story))
        .route("/api/pipeline/limits", get(story_routes::pipeline_limits))
}
