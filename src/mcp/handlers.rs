//! HTTP request handlers for MCP endpoints
//!
//! These handlers dispatch incoming SSE and message requests to the correct
//! MCP server instance based on the server name in the URL path.

use crate::mcp::registry::RegistryError;
use crate::mcp::router::SharedRouter;
use crate::models::StatusResponse;
use axum::{
    extract::{Path, Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Maps a routing failure onto the streaming endpoints' status codes
fn route_error_response(err: RegistryError) -> Response {
    let (status, message) = match &err {
        RegistryError::NotFound(_) => (StatusCode::NOT_FOUND, "server not found".to_string()),
        RegistryError::NotRunning(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            "server is not running".to_string(),
        ),
        RegistryError::Upstream { .. } => {
            tracing::error!(error = %err, "MCP engine failed");
            (StatusCode::BAD_GATEWAY, err.to_string())
        }
        RegistryError::AlreadyExists(_) | RegistryError::InvalidRequest(_) => {
            (StatusCode::BAD_REQUEST, err.to_string())
        }
    };

    (status, Json(StatusResponse::failure(message))).into_response()
}

/// Handles SSE connection requests for MCP servers
///
/// # Route
///
/// `GET /mcp/{name}/sse`
///
/// # Returns
///
/// * `200` - Event stream served by the instance's engine
/// * `404` - No instance with that name
/// * `503` - Instance exists but is stopped
pub async fn mcp_sse_handler(
    Path(name): Path<String>,
    State(router): State<SharedRouter>,
    request: Request,
) -> Response {
    match router.route_connect(&name, request).await {
        Ok(response) => response,
        Err(err) => {
            tracing::warn!(server = %name, error = %err, "Rejected SSE connection");
            route_error_response(err)
        }
    }
}

/// Handles MCP message POST requests
///
/// # Route
///
/// `POST /mcp/{name}/message?sessionId=...`
pub async fn mcp_message_handler(
    Path(name): Path<String>,
    State(router): State<SharedRouter>,
    request: Request,
) -> Response {
    match router.route_message(&name, request).await {
        Ok(response) => response,
        Err(err) => {
            tracing::warn!(server = %name, error = %err, "Rejected MCP message");
            route_error_response(err)
        }
    }
}

/// Fleet-wide liveness probe
///
/// # Route
///
/// `GET /mcp/ping`
pub async fn mcp_ping_handler(State(router): State<SharedRouter>) -> Response {
    match router.route_ping().await {
        Ok(()) => (StatusCode::OK, Json(json!({ "message": "ready" }))).into_response(),
        Err(err) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "message": err.to_string() })),
        )
            .into_response(),
    }
}
