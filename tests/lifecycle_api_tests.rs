use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use omcp::app::build_app;
use omcp::services::PluginStore;
use omcp::test_utils::test_helpers::{echo_tool, stub_registry};
use omcp::{mcp::SharedRegistry, AppState};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;

const BOUNDARY: &str = "omcp-test-boundary";

fn test_app(plugins: &TempDir, max_plugin_bytes: usize) -> (Router, SharedRegistry) {
    let (registry, _) = stub_registry();
    let registry = Arc::new(registry);
    let state = AppState::new(
        registry.clone(),
        PluginStore::new(plugins.path()),
        Duration::from_millis(200),
    );
    (build_app(state, max_plugin_bytes), registry)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn multipart_upload(file_name: &str, payload: &[u8], servers: &[&str]) -> Request<Body> {
    let mut body = Vec::new();
    for server in servers {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"servers\"\r\n\r\n{}\r\n",
                BOUNDARY, server
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(
        format!(
            "--{}\r\nContent-Disposition: form-data; name=\"plugin_file\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
            BOUNDARY, file_name
        )
        .as_bytes(),
    );
    body.extend_from_slice(payload);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method(Method::POST)
        .uri("/api/load")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

// Test 1: Readiness does not depend on any instance
#[tokio::test]
async fn test_ready() {
    let dir = TempDir::new().unwrap();
    let (app, _) = test_app(&dir, 1024);

    let (status, body) = send(&app, get("/ready")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": "ready" }));
}

// Test 2: Full create / start / list / stop / delete cycle
#[tokio::test]
async fn test_server_lifecycle_over_http() {
    let dir = TempDir::new().unwrap();
    let (app, _) = test_app(&dir, 1024);

    let (status, body) = send(
        &app,
        post_json(
            "/api/server/create",
            json!({ "name": "weather", "desc": "Weather tools" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["server"]["name"], "weather");
    assert_eq!(body["server"]["version"], "0.0.1");
    assert_eq!(body["server"]["state"], "stopped");

    let (status, body) = send(
        &app,
        post_json("/api/server/start", json!({ "name": "weather" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true, "message": "success" }));

    let (_, body) = send(&app, get("/api/server/list?is_alive=true")).await;
    let servers = body["servers"].as_array().unwrap();
    assert_eq!(servers.len(), 1);
    assert_eq!(servers[0]["state"], "running");
    assert_eq!(servers[0]["desc"], "Weather tools");

    let (status, _) = send(
        &app,
        post_json("/api/server/stop", json!({ "name": "weather" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&app, get("/api/server/list?is_alive=true")).await;
    assert!(body["servers"].as_array().unwrap().is_empty());
    let (_, body) = send(&app, get("/api/server/list")).await;
    assert_eq!(body["servers"].as_array().unwrap().len(), 1);

    let (status, _) = send(
        &app,
        post_json("/api/server/delete", json!({ "name": "weather" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&app, get("/api/server/list")).await;
    assert!(body["servers"].as_array().unwrap().is_empty());
}

// Test 3: Error kinds map to status codes with the failure envelope
#[tokio::test]
async fn test_lifecycle_error_statuses() {
    let dir = TempDir::new().unwrap();
    let (app, _) = test_app(&dir, 1024);

    send(&app, post_json("/api/server/create", json!({ "name": "a" }))).await;

    let (status, body) = send(&app, post_json("/api/server/create", json!({ "name": "a" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().unwrap().contains("a"));

    let (status, body) = send(
        &app,
        post_json("/api/server/create", json!({ "name": "bad name!" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    for path in ["/api/server/start", "/api/server/stop", "/api/server/delete"] {
        let (status, body) = send(&app, post_json(path, json!({ "name": "ghost" }))).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{}", path);
        assert_eq!(body["success"], false);
    }

    let (status, _) = send(&app, get("/api/tool/list?server=ghost")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// Test 4: Tools are listed in registration order with a total
#[tokio::test]
async fn test_tool_list() {
    let dir = TempDir::new().unwrap();
    let (app, registry) = test_app(&dir, 1024);

    registry
        .create("a", "", "")
        .await
        .unwrap()
        .add_tools(vec![echo_tool("first"), echo_tool("second")])
        .await
        .unwrap();

    let (status, body) = send(&app, get("/api/tool/list?server=a")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
    let names: Vec<_> = body["tools"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["first", "second"]);

    let (status, body) = send(&app, get("/api/tool/list?server=")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

// Test 5: Plugin upload stores the artifact and reports its digest
#[tokio::test]
async fn test_plugin_upload() {
    let dir = TempDir::new().unwrap();
    let (app, registry) = test_app(&dir, 1024);
    registry.create("a", "", "").await.unwrap();

    let (status, body) = send(&app, multipart_upload("hello.so", b"hello", &["a"])).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["success"], true);
    assert_eq!(body["file_name"], "hello.so");
    assert_eq!(body["size"], 5);
    assert_eq!(
        body["sha256"],
        "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
    );
    assert_eq!(body["servers"], json!(["a"]));

    let stored = std::fs::read(dir.path().join("hello.so")).unwrap();
    assert_eq!(stored, b"hello");
}

// Test 6: Plugin upload rejections
#[tokio::test]
async fn test_plugin_upload_rejections() {
    let dir = TempDir::new().unwrap();
    let (app, _) = test_app(&dir, 1024);

    // Unknown target server
    let (status, _) = send(&app, multipart_upload("p.so", b"x", &["ghost"])).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Empty payload
    let (status, body) = send(&app, multipart_upload("p.so", b"", &[])).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    // Hidden file name
    let (status, _) = send(&app, multipart_upload(".p.so", b"x", &[])).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Over the body limit
    let big = vec![0u8; 4096];
    let (status, _) = send(&app, multipart_upload("big.so", &big, &[])).await;
    assert!(status.is_client_error(), "got {}", status);

    // Nothing was written
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

// Test 7: Malformed requests still get the failure envelope
#[tokio::test]
async fn test_malformed_requests_use_envelope() {
    let dir = TempDir::new().unwrap();
    let (app, registry) = test_app(&dir, 1024);

    // Body is not JSON
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/server/create")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["message"].is_string());

    // Required field is missing
    let (status, body) = send(&app, post_json("/api/server/start", json!({ "nam": "x" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().unwrap().contains("name"));

    // Query values of the wrong type
    let (status, body) = send(&app, get("/api/server/list?is_alive=maybe")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    // Query parameter is absent
    let (status, body) = send(&app, get("/api/tool/list")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    // Nothing was created along the way
    assert!(registry.list(omcp::mcp::ListFilter::All).await.is_empty());
}
