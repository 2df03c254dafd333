use axum::response::Json;
use serde_json::{json, Value};

/// GET /ready
///
/// Answers as soon as the HTTP listener is up; it does not consult any MCP
/// instance. Use `/mcp/ping` for instance health.
pub async fn ready() -> Json<Value> {
    Json(json!({ "message": "ready" }))
}
