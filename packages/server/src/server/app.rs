//! Application setup and server configuration.

use std::sync::Arc;

use axum::{
    extract::Extension,
    http::{header::CONTENT_TYPE, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::domains::intent::IntentRouter;
use crate::server::routes::{health_handler, search_handler, suggestions_handler};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<IntentRouter>,
}

/// Build the Axum application router
pub fn build_app(router: Arc<IntentRouter>) -> Router {
    let app_state = AppState { router };

    // The search box is embedded in pages served from other origins
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE]);

    Router::new()
        .route("/:year/search", post(search_handler))
        .route("/search_suggestions", post(suggestions_handler))
        .route("/health", get(health_handler))
        // Middleware layers (applied in reverse order - last added runs first)
        .layer(Extension(app_state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
