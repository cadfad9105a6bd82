//! In-process router tests: requests go through `build_router` with
//! `oneshot`, no listener involved.

mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use common::test_config;
use docqa_service::services::providers::mock::MockTextProvider;
use docqa_service::services::InMemorySessionStore;
use docqa_service::startup::{build_router, AppState};
use http_body_util::BodyExt;
use serde_json::json;
use std::sync::Arc;
use tower::ServiceExt;

fn router(provider: Arc<MockTextProvider>) -> Router {
    let state = AppState::new(
        test_config(1024),
        Arc::new(InMemorySessionStore::new()),
        provider,
    );
    build_router(state)
}

async fn post_json(
    router: Router,
    uri: &str,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn missing_session_id_wins_over_invalid_count() {
    let provider = Arc::new(MockTextProvider::new(true));

    let (status, body) =
        post_json(router(provider.clone()), "/api/generate-mcq", json!({"count": 0})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing session ID.");
    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn invalid_count_with_session_id_is_a_validation_error() {
    let provider = Arc::new(MockTextProvider::new(true));

    let (status, body) = post_json(
        router(provider.clone()),
        "/api/generate-mcq",
        json!({"sessionId": "s-1-abcdef", "count": 0}),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "Validation error");
    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let response = router(Arc::new(MockTextProvider::new(true)))
        .oneshot(Request::builder().uri("/api/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
