//! HTTP surface tests: requests go through the full axum stack.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    http::{header::CONTENT_TYPE, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use gbbinfo_core::domains::intent::{IntentCache, IntentRouter, NameIndex, RouterSettings, SiteLayout};
use gbbinfo_core::domains::participants::ParticipantRow;
use gbbinfo_core::kernel::{MockOracle, TestDependencies};
use gbbinfo_core::server::build_app;

fn app_with(oracle: MockOracle, settings: RouterSettings) -> (Router, Arc<MockOracle>) {
    let deps = TestDependencies::new().mock_oracle(oracle);
    let oracle = deps.oracle.clone();

    let rows = vec![ParticipantRow {
        display_name: "Rofu".to_string(),
        category: "Solo".to_string(),
        ticket_class: "GBB24 Top 3".to_string(),
        members: String::new(),
        country_code: "250".to_string(),
    }];
    let table = [("ABOUT", "/others/about"), ("チケット", "/__year__/ticket")];
    let index = NameIndex::build(table.iter().map(|(k, _)| *k), &rows);
    let cache = IntentCache::seed(table, &index);

    let router = IntentRouter::new(
        SiteLayout::default(),
        settings,
        cache,
        &index,
        deps.into_server_deps(),
    );
    (build_app(Arc::new(router)), oracle)
}

fn app(oracle: MockOracle) -> (Router, Arc<MockOracle>) {
    app_with(
        oracle,
        RouterSettings {
            oracle_interval: Duration::from_millis(1),
            oracle_retry_delay: Duration::from_millis(1),
            ..RouterSettings::default()
        },
    )
}

async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_search_cache_hit() {
    let (app, oracle) = app(MockOracle::new());

    let (status, body) = post_json(app, "/2025/search", json!({"question": "チケット"})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"url": "/2025/ticket"}));
    assert_eq!(oracle.call_count(), 0);
}

#[tokio::test]
async fn test_search_through_oracle() {
    let (app, _) = app(MockOracle::new().with_response(
        r#"{"url": "https://gbbinfo-jpn.onrender.com/2024/time_schedule", "parameter": "7tosmoke", "name": "None"}"#,
    ));

    let (status, body) = post_json(
        app,
        "/2024/search",
        json!({"question": "24年のタイムスケジュールを教えて"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["url"], "/2024/time_schedule?scroll=7tosmoke");
}

#[tokio::test]
async fn test_search_from_excluded_season_page() {
    let (app, oracle) = app(MockOracle::new());

    let (_, body) = post_json(app, "/2022/search", json!({"question": "ルール"})).await;

    assert_eq!(body["url"], "/2022/top");
    assert_eq!(oracle.call_count(), 0);
}

#[tokio::test]
async fn test_search_from_unknown_season_uses_latest() {
    let (app, _) = app(MockOracle::new());

    let (_, body) = post_json(app, "/1999/search", json!({"question": "チケット"})).await;

    assert_eq!(body["url"], "/2025/ticket");
}

#[tokio::test]
async fn test_search_timeout_returns_fallback() {
    let (app, _) = app_with(
        MockOracle::new().with_stalled_response(Duration::from_secs(10), "{}"),
        RouterSettings {
            oracle_interval: Duration::from_millis(1),
            oracle_attempt_timeout: Duration::from_secs(30),
            resolve_timeout: Duration::from_millis(100),
            ..RouterSettings::default()
        },
    );

    let (status, body) = post_json(app, "/2024/search", json!({"question": "会場は？"})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["url"], "/2024/top?scroll=contact");
}

#[tokio::test]
async fn test_search_timeout_fallback_uses_season_from_question() {
    let (app, _) = app_with(
        MockOracle::new().with_stalled_response(Duration::from_secs(10), "{}"),
        RouterSettings {
            oracle_interval: Duration::from_millis(1),
            oracle_attempt_timeout: Duration::from_secs(30),
            resolve_timeout: Duration::from_millis(100),
            ..RouterSettings::default()
        },
    );

    let (_, body) = post_json(app, "/2025/search", json!({"question": "2024の会場は？"})).await;

    assert_eq!(body["url"], "/2024/top?scroll=contact");
}

#[tokio::test]
async fn test_search_rejects_missing_question() {
    let (app, _) = app(MockOracle::new());

    let request = Request::builder()
        .method(Method::POST)
        .uri("/2025/search")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"text": "hi"}"#))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_search_suggestions() {
    let (app, _) = app(MockOracle::new());

    let (status, body) = post_json(app, "/search_suggestions", json!({"input": "rof"})).await;

    assert_eq!(status, StatusCode::OK);
    let suggestions = body["suggestions"].as_array().unwrap();
    assert!(suggestions.len() <= 3);
    assert_eq!(suggestions[0], "ROFU");
}

#[tokio::test]
async fn test_search_suggestions_empty_input() {
    let (app, _) = app(MockOracle::new());

    let (_, body) = post_json(app, "/search_suggestions", json!({"input": "  2025 "})).await;

    assert_eq!(body, json!({"suggestions": []}));
}

#[tokio::test]
async fn test_health_reports_counts() {
    let (app, _) = app(MockOracle::new());

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(body["status"], "healthy");
    assert_eq!(body["intent_entries"], 3);
    assert_eq!(body["index_tokens"], 3);
}
