use axum::{extract::Extension, Json};
use serde::Serialize;

use crate::server::app::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: String,
    intent_entries: usize,
    index_tokens: usize,
}

/// Health check endpoint
///
/// Everything the router needs is loaded before the listener binds, so a
/// responding process is a healthy one. The counts make an empty dataset
/// visible.
pub async fn health_handler(Extension(state): Extension<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        intent_entries: state.router.intent_entries(),
        index_tokens: state.router.index_tokens(),
    })
}
