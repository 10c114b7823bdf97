use axum::{
    extract::{Extension, Path},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::server::app::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub question: String,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub url: String,
}

/// Resolve a visitor question asked from the page of season `year`.
///
/// Always answers 200 with a site-relative URL. A resolution that outlives
/// the configured bound is abandoned in favor of the season's landing page.
pub async fn search_handler(
    Extension(state): Extension<AppState>,
    Path(year): Path<i32>,
    Json(request): Json<SearchRequest>,
) -> Json<SearchResponse> {
    let router = &state.router;
    let bound = router.settings().resolve_timeout;

    let url = match tokio::time::timeout(bound, router.resolve_from_page(year, &request.question)).await {
        Ok(resolution) => {
            tracing::debug!(source = ?resolution.source, year = resolution.year, "Question resolved");
            resolution.url
        }
        Err(_) => {
            tracing::error!(
                year,
                question = %request.question,
                timeout = ?bound,
                "Resolution timed out, using fallback"
            );
            router.timed_out(year, &request.question)
        }
    };

    Json(SearchResponse {
        url: url.to_string(),
    })
}
