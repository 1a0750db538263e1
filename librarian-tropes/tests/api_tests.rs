//! Integration tests for the HTTP API

mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use common::{heros_journey_sources, identifier, MockSource};
use http_body_util::BodyExt;
use librarian_tropes::collector::CollectorConfig;
use librarian_tropes::types::SourceId;
use librarian_tropes::{build_router, AppState};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::util::ServiceExt;

/// Test helper: create test app over scripted sources
fn create_test_app(sources: Vec<Arc<MockSource>>) -> axum::Router {
    let pipeline = identifier(sources, CollectorConfig::default());
    build_router(AppState::new(Arc::new(pipeline)))
}

async fn post_tropes(app: axum::Router, body: &Value) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/tropes")
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_string(body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_app(heros_journey_sources());

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(json["status"], "ok");
    assert_eq!(json["module"], "librarian-tropes");
    assert_eq!(
        json["configured_sources"],
        json!(["llm_knowledge", "internet_search", "database"])
    );
}

#[tokio::test]
async fn test_health_degraded_without_credentials() {
    let app = create_test_app(vec![
        MockSource::ok(SourceId::LlmKnowledge, &[]),
        MockSource::unconfigured(SourceId::Database),
    ]);

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(json["status"], "degraded");
    assert_eq!(json["configured_sources"], json!(["llm_knowledge"]));
}

#[tokio::test]
async fn test_identify_success() {
    let app = create_test_app(heros_journey_sources());

    let (status, json) = post_tropes(
        app,
        &json!({"title": "The Hobbit", "author": "J.R.R. Tolkien", "top_n": 3}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "success");
    assert_eq!(json["tropes"][0]["name"], "Hero's Journey");
    assert_eq!(
        json["tropes"][0]["sources"],
        json!(["llm_knowledge", "internet_search", "database"])
    );
}

#[tokio::test]
async fn test_identify_validation_error() {
    let sources = heros_journey_sources();
    let app = create_test_app(sources.clone());

    let (status, json) = post_tropes(app, &json!({"title": "", "author": "Frank Herbert"})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["status"], "error");
    assert!(json["message"].as_str().unwrap().contains("'title'"));
    assert!(sources.iter().all(|s| s.call_count() == 0));
}

#[tokio::test]
async fn test_identify_missing_body() {
    let app = create_test_app(heros_journey_sources());

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/tropes")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "error");
}

#[tokio::test]
async fn test_all_sources_failed_is_bad_gateway() {
    let app = create_test_app(vec![
        MockSource::failing(SourceId::LlmKnowledge),
        MockSource::failing(SourceId::InternetSearch),
        MockSource::failing(SourceId::Database),
    ]);

    let (status, json) = post_tropes(app, &json!({"title": "Dune", "author": "Frank Herbert"})).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["status"], "error");
    assert_eq!(
        json["message"],
        "No trope sources are currently available (llm_knowledge, internet_search, database)"
    );
}

#[tokio::test]
async fn test_last_error_reported_by_health() {
    let pipeline = identifier(
        vec![MockSource::failing(SourceId::Database)],
        CollectorConfig::default(),
    );
    let state = AppState::new(Arc::new(pipeline));
    let app = build_router(state.clone());

    let (status, _) = post_tropes(app.clone(), &json!({"title": "Dune", "author": "Frank Herbert"})).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(
        json["last_error"],
        "No trope sources are currently available (database)"
    );
}
