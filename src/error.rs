use crate::mcp::registry::RegistryError;
use crate::models::StatusResponse;
use crate::services::{LifecycleError, PluginStoreError};
use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use thiserror::Error;

// Type alias for Result with our AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Errors surfaced by the lifecycle API
///
/// Every variant renders as `{"success": false, "message": ...}` with a
/// status code chosen by [`AppError::status_code`].
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Plugin(#[from] PluginStoreError),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<LifecycleError> for AppError {
    fn from(err: LifecycleError) -> Self {
        match err {
            LifecycleError::Registry(e) => AppError::Registry(e),
            LifecycleError::Plugin(e) => AppError::Plugin(e),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Registry(RegistryError::NotFound(_)) => StatusCode::NOT_FOUND,
            AppError::Registry(RegistryError::AlreadyExists(_))
            | AppError::Registry(RegistryError::NotRunning(_)) => StatusCode::CONFLICT,
            AppError::Registry(RegistryError::InvalidRequest(_)) | AppError::Validation(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Registry(RegistryError::Upstream { .. }) => StatusCode::BAD_GATEWAY,
            AppError::Plugin(PluginStoreError::InvalidFileName(_))
            | AppError::Plugin(PluginStoreError::EmptyPayload) => StatusCode::BAD_REQUEST,
            AppError::Plugin(PluginStoreError::Io(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            AppError::Plugin(PluginStoreError::Io(e)) => {
                tracing::error!(error = %e, "Plugin storage failed");
                "Internal server error".to_string()
            }
            AppError::Registry(RegistryError::Upstream { .. }) => {
                tracing::error!(error = %self, "MCP engine failed");
                self.to_string()
            }
            _ => self.to_string(),
        };

        (status, Json(StatusResponse::failure(message))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::engine::EngineError;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (
                AppError::Registry(RegistryError::NotFound("a".into())),
                StatusCode::NOT_FOUND,
            ),
            (
                AppError::Registry(RegistryError::AlreadyExists("a".into())),
                StatusCode::CONFLICT,
            ),
            (
                AppError::Registry(RegistryError::NotRunning("a".into())),
                StatusCode::CONFLICT,
            ),
            (
                AppError::Registry(RegistryError::InvalidRequest("bad".into())),
                StatusCode::BAD_REQUEST,
            ),
            (
                AppError::Registry(RegistryError::upstream("a", EngineError::ShutDown)),
                StatusCode::BAD_GATEWAY,
            ),
            (
                AppError::Plugin(PluginStoreError::EmptyPayload),
                StatusCode::BAD_REQUEST,
            ),
            (AppError::Validation("x".into()), StatusCode::BAD_REQUEST),
        ];

        for (err, expected) in cases {
            assert_eq!(err.status_code(), expected, "{}", err);
        }
    }

    #[test]
    fn test_io_error_message_is_generic() {
        let err = AppError::Plugin(PluginStoreError::Io(std::io::Error::other("disk on fire")));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
