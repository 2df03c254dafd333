use crate::error::AppError;
use crate::models::LoadPluginResponse;
use crate::AppState;
use axum::{
    extract::{multipart::Multipart, State},
    response::Json,
};

const PLUGIN_FIELD: &str = "plugin_file";
const SERVERS_FIELD: &str = "servers";

/// POST /api/load
///
/// Accepts a multipart form with one `plugin_file` part and any number of
/// `servers` text parts naming the instances the plugin is meant for. The
/// artifact is stored in the plugin directory; it is not loaded into an
/// engine.
///
/// ## Errors
/// - 400 Bad Request: missing or empty file, bad file name, malformed form
/// - 404 Not Found: a named target server does not exist
pub async fn load_plugin(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<LoadPluginResponse>, AppError> {
    let mut upload: Option<(String, Vec<u8>)> = None;
    let mut servers = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart body: {}", e)))?
    {
        let field_name = field.name().map(str::to_owned);
        match field_name.as_deref() {
            Some(PLUGIN_FIELD) => {
                let file_name = field
                    .file_name()
                    .map(str::to_owned)
                    .ok_or_else(|| AppError::Validation("plugin_file has no file name".into()))?;
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read upload: {}", e)))?;
                upload = Some((file_name, bytes.to_vec()));
            }
            Some(SERVERS_FIELD) => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Invalid servers field: {}", e)))?;
                servers.extend(
                    text.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_owned),
                );
            }
            other => {
                tracing::debug!(field = ?other, "Ignoring unknown multipart field");
            }
        }
    }

    let (file_name, payload) =
        upload.ok_or_else(|| AppError::Validation("plugin_file is required".to_string()))?;

    let artifact = state
        .lifecycle
        .load_plugin(&file_name, &payload, &servers)
        .await?;

    Ok(Json(LoadPluginResponse {
        success: true,
        message: "success".to_string(),
        file_name: Some(artifact.file_name),
        sha256: Some(artifact.sha256),
        size: Some(artifact.size),
        servers,
    }))
}
