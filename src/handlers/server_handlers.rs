use crate::error::AppError;
use crate::handlers::extract::{ApiJson, ApiQuery};
use crate::models::{
    CreateServerRequest, CreateServerResponse, ListServersQuery, ListServersResponse,
    ServerNameRequest, StatusResponse,
};
use crate::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};

/// POST /api/server/create
///
/// Registers a new instance in the stopped state. An empty `version` falls
/// back to the default version.
///
/// ## Errors
/// - 400 Bad Request: malformed body or invalid server name
/// - 409 Conflict: name already taken
pub async fn create_server(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateServerRequest>,
) -> Result<Response, AppError> {
    let snapshot = state
        .lifecycle
        .create_server(&request.name, &request.desc, &request.version)
        .await?;

    tracing::info!(server = %snapshot.name, version = %snapshot.version, "Created server");

    let response = CreateServerResponse {
        success: true,
        message: "success".to_string(),
        server: Some(snapshot),
    };
    Ok((StatusCode::OK, Json(response)).into_response())
}

/// POST /api/server/delete
pub async fn delete_server(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ServerNameRequest>,
) -> Result<Json<StatusResponse>, AppError> {
    state.lifecycle.delete_server(&request.name).await?;
    tracing::info!(server = %request.name, "Deleted server");
    Ok(Json(StatusResponse::ok()))
}

/// POST /api/server/start
///
/// Starting a running server is a no-op that still succeeds.
pub async fn start_server(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ServerNameRequest>,
) -> Result<Json<StatusResponse>, AppError> {
    state.lifecycle.start_server(&request.name).await?;
    tracing::info!(server = %request.name, "Started server");
    Ok(Json(StatusResponse::ok()))
}

/// POST /api/server/stop
pub async fn stop_server(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ServerNameRequest>,
) -> Result<Json<StatusResponse>, AppError> {
    state.lifecycle.stop_server(&request.name).await?;
    tracing::info!(server = %request.name, "Stopped server");
    Ok(Json(StatusResponse::ok()))
}

/// GET /api/server/list?is_alive=bool
pub async fn list_servers(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListServersQuery>,
) -> Result<Json<ListServersResponse>, AppError> {
    let servers = state.lifecycle.list_servers(query.is_alive).await;
    Ok(Json(ListServersResponse { servers }))
}
