use axum::{extract::Extension, Json};
use serde::{Deserialize, Serialize};

use crate::server::app::AppState;

#[derive(Debug, Deserialize)]
pub struct SuggestionsRequest {
    pub input: String,
}

#[derive(Debug, Serialize)]
pub struct SuggestionsResponse {
    pub suggestions: Vec<String>,
}

/// Typeahead for the search box.
pub async fn suggestions_handler(
    Extension(state): Extension<AppState>,
    Json(request): Json<SuggestionsRequest>,
) -> Json<SuggestionsResponse> {
    Json(SuggestionsResponse {
        suggestions: state.router.suggest(&request.input),
    })
}
