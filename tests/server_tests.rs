//! Integration tests for the HTTP control surface.

mod common;

use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use feed_pager::config::Config;
use feed_pager::paginator::Paginator;
use feed_pager::server::api::{build_router, AppState};

use common::{builder, settled, ScriptedSource};

async fn app() -> (Router, Paginator<ScriptedSource>) {
    let source = ScriptedSource::new();
    let paginator = builder(&source, "/posts").open();
    settled(&mut paginator.subscribe()).await;

    let state = Arc::new(AppState {
        paginator: paginator.clone(),
        config: Arc::new(Config::default()),
        start_time: Instant::now(),
    });
    (build_router(state), paginator)
}

async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test(start_paused = true)]
async fn test_feed_state() {
    let (app, _paginator) = app().await;
    let (status, body) = call(&app, "GET", "/v1/feed", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["current_page"], 1);
    assert_eq!(body["items"].as_array().unwrap().len(), common::ITEMS_PER_PAGE);
    assert_eq!(body["pagination"]["pages"], 5);
    assert_eq!(body["error"], Value::Null);
}

#[tokio::test(start_paused = true)]
async fn test_navigation() {
    let (app, paginator) = app().await;

    let (status, body) = call(&app, "POST", "/v1/feed/page/2", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["accepted"], true);
    assert_eq!(body["state"]["current_page"], 2);
    assert_eq!(body["state"]["is_loading"], true);

    let (_, body) = call(&app, "POST", "/v1/feed/page/9", None).await;
    assert_eq!(body["accepted"], false);

    let state = settled(&mut paginator.subscribe()).await;
    assert_eq!(state.items, common::items("/posts", 2));
}

#[tokio::test(start_paused = true)]
async fn test_endpoint_switch() {
    let (app, _paginator) = app().await;

    let (status, body) = call(
        &app,
        "PUT",
        "/v1/feed/endpoint",
        Some(serde_json::json!({ "endpoint": "/posts?sort=new" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["accepted"], true);
    assert_eq!(body["state"]["is_stale"], true);

    let (status, _) = call(
        &app,
        "PUT",
        "/v1/feed/endpoint",
        Some(serde_json::json!({ "endpoint": "posts" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test(start_paused = true)]
async fn test_refresh_and_cache_control() {
    let (app, paginator) = app().await;

    let (status, _) = call(&app, "POST", "/v1/feed/refresh", None).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    settled(&mut paginator.subscribe()).await;

    let (status, body) = call(&app, "GET", "/v1/cache/stats", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cache"]["entries"], 1);
    assert_eq!(body["foreground"]["completed"], 2);

    let (status, _) = call(&app, "DELETE", "/v1/cache", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(paginator.cache_stats().entries, 0);
}

#[tokio::test(start_paused = true)]
async fn test_health_and_metrics() {
    let (app, _paginator) = app().await;

    let (status, body) = call(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["endpoint"], "/posts");
    assert_eq!(body["phase"], "loaded");

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("feed_pager_cache_entries 1"));
}
