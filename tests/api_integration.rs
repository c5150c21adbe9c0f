//! HTTP API integration tests
//!
//! The router is exercised in-process with `tower::ServiceExt::oneshot`.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use email_template_cache::collection::{Snapshot, TemplateDocument};
use email_template_cache::config::{RedisConfig, ServerConfig, Settings};
use email_template_cache::server::{create_app, AppState};
use email_template_cache::template::TemplateCache;

fn test_app(templates: Arc<TemplateCache>) -> Router {
    let settings = Settings {
        server: ServerConfig::default(),
        redis: RedisConfig::default(),
    };
    create_app(AppState::new(settings, templates))
}

fn loaded_cache() -> Arc<TemplateCache> {
    let cache = Arc::new(TemplateCache::detached());
    cache.handle_snapshot(&Snapshot::new(vec![
        TemplateDocument::new("welcome")
            .subject("Hi {{name}}")
            .html("<p>Hi {{name}}</p>"),
        TemplateDocument::new("receipt").text("Total: {{total}}"),
    ]));
    cache
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn render_request(name: &str, data: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(format!("/api/v1/templates/{}/render", name))
        .header("content-type", "application/json")
        .body(Body::from(data.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_health_loading_before_first_snapshot() {
    let app = test_app(Arc::new(TemplateCache::detached()));

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = body_json(response).await;
    assert_eq!(body["status"], "loading");
    assert_eq!(body["snapshots"], 0);
    assert_eq!(body["source"], "email:templates");
}

#[tokio::test]
async fn test_health_ready_after_snapshot() {
    let app = test_app(loaded_cache());

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ready");
    assert_eq!(body["templates"], 2);
}

#[tokio::test]
async fn test_render_endpoint() {
    let app = test_app(loaded_cache());

    let response = app
        .oneshot(render_request("welcome", json!({"name": "<Ana>"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["subject"], "Hi <Ana>");
    assert_eq!(body["html"], "<p>Hi &lt;Ana&gt;</p>");
    assert!(body["text"].is_null());
    assert!(body["amp"].is_null());
}

#[tokio::test]
async fn test_render_unknown_template_returns_404() {
    let app = test_app(loaded_cache());

    let response = app
        .oneshot(render_request("missing", json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "TEMPLATE_NOT_FOUND");
    assert_eq!(
        body["error"]["message"],
        "tried to render non-existent template 'missing'"
    );
}

#[tokio::test]
async fn test_render_broken_template_returns_422() {
    let cache = Arc::new(TemplateCache::detached());
    cache.handle_snapshot(&Snapshot::new(vec![
        TemplateDocument::new("broken").html("{{#if x}}{{/each}}")
    ]));
    let app = test_app(cache);

    let response = app
        .oneshot(render_request("broken", json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "TEMPLATE_COMPILE_FAILED");
}

#[tokio::test]
async fn test_list_templates() {
    let app = test_app(loaded_cache());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/templates")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["templates"], json!(["receipt", "welcome"]));
    assert_eq!(body["total"], 2);
}
