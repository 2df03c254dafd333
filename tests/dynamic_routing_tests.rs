use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use omcp::app::build_app;
use omcp::mcp::{McpServerRegistry, SharedRegistry, SseEngineFactory};
use omcp::services::PluginStore;
use omcp::test_utils::test_helpers::{stub_registry, StubEngineFactory};
use omcp::AppState;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;

struct TestApp {
    app: Router,
    registry: SharedRegistry,
    factory: Arc<StubEngineFactory>,
    _plugins: TempDir,
}

fn stub_app() -> TestApp {
    let (registry, factory) = stub_registry();
    let registry = Arc::new(registry);
    let plugins = TempDir::new().expect("Failed to create temp dir");
    let state = AppState::new(
        registry.clone(),
        PluginStore::new(plugins.path()),
        Duration::from_millis(200),
    );

    TestApp {
        app: build_app(state, 1024 * 1024),
        registry,
        factory,
        _plugins: plugins,
    }
}

fn sse_get(name: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(format!("/mcp/{}/sse", name))
        .header(header::ACCEPT, "text/event-stream")
        .body(Body::empty())
        .expect("Failed to build request")
}

fn message_post(name: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(format!("/mcp/{}/message?sessionId=abc", name))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#))
        .expect("Failed to build request")
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    serde_json::from_slice(&bytes).expect("Body should be JSON")
}

// Test 1: Unknown server names are 404 on both protocol paths
#[tokio::test]
async fn test_unknown_server_is_not_found() {
    let t = stub_app();

    let response = t.app.clone().oneshot(sse_get("ghost")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = json_body(response).await;
    assert_eq!(body["success"], false);

    let response = t.app.clone().oneshot(message_post("ghost")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// Test 2: Stopped servers are 503 and the engine never sees the request
#[tokio::test]
async fn test_stopped_server_is_unavailable() {
    let t = stub_app();
    t.registry
        .create("weather", "", "")
        .await
        .expect("Create should succeed");

    let response = t.app.clone().oneshot(sse_get("weather")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let response = t.app.clone().oneshot(message_post("weather")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let engine = t.factory.engine("weather").expect("Engine should exist");
    assert_eq!(engine.connections(), 0);
    assert_eq!(engine.messages(), 0);
}

// Test 3: Running servers receive traffic through their own engine
#[tokio::test]
async fn test_running_server_is_dispatched_by_name() {
    let t = stub_app();
    for name in ["alpha", "beta"] {
        t.registry
            .create(name, "", "")
            .await
            .expect("Create should succeed")
            .start()
            .await
            .expect("Start should succeed");
    }

    let response = t.app.clone().oneshot(sse_get("alpha")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/event-stream"
    );
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(String::from_utf8_lossy(&body).contains("/mcp/alpha/message"));

    let response = t.app.clone().oneshot(message_post("beta")).await.unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let alpha = t.factory.engine("alpha").unwrap();
    let beta = t.factory.engine("beta").unwrap();
    assert_eq!((alpha.connections(), alpha.messages()), (1, 0));
    assert_eq!((beta.connections(), beta.messages()), (0, 1));
}

// Test 4: Deleting a server while a stream is open
#[tokio::test]
async fn test_delete_with_open_stream() {
    let registry: SharedRegistry = Arc::new(McpServerRegistry::new(Arc::new(
        SseEngineFactory::new(Duration::from_secs(5)),
    )));
    let plugins = TempDir::new().unwrap();
    let app = build_app(
        AppState::new(
            registry.clone(),
            PluginStore::new(plugins.path()),
            Duration::from_secs(1),
        ),
        1024,
    );

    registry
        .create("weather", "", "")
        .await
        .unwrap()
        .start()
        .await
        .unwrap();

    // Stream stays open while we delete
    let open_stream = app.clone().oneshot(sse_get("weather")).await.unwrap();
    assert_eq!(open_stream.status(), StatusCode::OK);

    let delete = Request::builder()
        .method(Method::POST)
        .uri("/api/server/delete")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"name":"weather"}"#))
        .unwrap();
    let response = app.clone().oneshot(delete).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // New traffic no longer resolves
    let response = app.clone().oneshot(sse_get("weather")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // The old response is still a live stream handle
    assert_eq!(
        open_stream.headers()[header::CONTENT_TYPE],
        "text/event-stream"
    );
    drop(open_stream);

    // The name can be reused immediately
    registry
        .create("weather", "", "")
        .await
        .expect("Name should be free after delete");
}

// Test 5: Ping reports the fleet state
#[tokio::test]
async fn test_ping_endpoint() {
    let t = stub_app();

    // Empty fleet is healthy
    let ping = || {
        Request::builder()
            .uri("/mcp/ping")
            .body(Body::empty())
            .unwrap()
    };
    let response = t.app.clone().oneshot(ping()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["message"], "ready");

    t.registry.create("a", "", "").await.unwrap();
    t.registry.create("b", "", "").await.unwrap();
    let response = t.app.clone().oneshot(ping()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // A hanging engine trips the timeout
    t.factory
        .engine("b")
        .unwrap()
        .set_ping_delay(Duration::from_secs(5));
    let response = t.app.clone().oneshot(ping()).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = json_body(response).await;
    assert!(body["message"].as_str().unwrap().contains("in b"));
}

// Test 6: CORS preflight is answered on the MCP routes
#[tokio::test]
async fn test_cors_preflight_on_mcp_routes() {
    let t = stub_app();

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/mcp/any/sse")
        .header(header::ORIGIN, "http://localhost:3000")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
        .body(Body::empty())
        .unwrap();
    let response = t.app.clone().oneshot(request).await.unwrap();

    assert!(response.status().is_success());
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
}
