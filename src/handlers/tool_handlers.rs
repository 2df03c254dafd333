use crate::error::AppError;
use crate::handlers::extract::ApiQuery;
use crate::models::{ListToolsQuery, ListToolsResponse};
use crate::AppState;
use axum::{extract::State, response::Json};

/// GET /api/tool/list?server=name
///
/// Tools are returned in registration order.
pub async fn list_tools(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListToolsQuery>,
) -> Result<Json<ListToolsResponse>, AppError> {
    if query.server.trim().is_empty() {
        return Err(AppError::Validation("server is required".to_string()));
    }

    let tools = state.lifecycle.list_tools(&query.server).await?;
    Ok(Json(ListToolsResponse {
        total: tools.len() as i64,
        tools,
    }))
}
