use crate::handlers::{health_handlers, plugin_handlers, server_handlers, tool_handlers};
use crate::mcp::{self, SharedRegistry, SharedRouter};
use crate::AppState;
use std::future::Future;
use axum::{
    extract::DefaultBodyLimit,
    http::HeaderName,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Builds the complete HTTP application
///
/// Lifecycle routes share [`AppState`]; MCP routes only need the
/// instance router and carry a permissive CORS layer for browser clients.
pub fn build_app(state: AppState, max_plugin_bytes: usize) -> Router {
    let lifecycle_routes = Router::new()
        .route("/ready", get(health_handlers::ready))
        .route("/api/server/list", get(server_handlers::list_servers))
        .route("/api/server/create", post(server_handlers::create_server))
        .route("/api/server/delete", post(server_handlers::delete_server))
        .route("/api/server/start", post(server_handlers::start_server))
        .route("/api/server/stop", post(server_handlers::stop_server))
        .route("/api/tool/list", get(tool_handlers::list_tools))
        .route(
            "/api/load",
            post(plugin_handlers::load_plugin).layer(DefaultBodyLimit::max(max_plugin_bytes)),
        )
        .with_state(state.clone());

    Router::new()
        .merge(lifecycle_routes)
        .merge(mcp_routes(state.router))
        .layer(TraceLayer::new_for_http())
}

/// Waits for `signal`, then shuts every engine down
///
/// Graceful shutdown waits for open connections, and MCP event streams only
/// end once their engine is cancelled.
pub async fn shutdown_on<F>(signal: F, registry: SharedRegistry)
where
    F: Future<Output = ()>,
{
    signal.await;
    tracing::info!("Shutting down MCP engines");
    registry.shutdown_all().await;
}

fn mcp_routes(router: SharedRouter) -> Router {
    // Authorization must be listed explicitly, it is not covered by a wildcard
    let cors_layer = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::AUTHORIZATION,
            axum::http::header::ACCEPT,
            axum::http::header::CACHE_CONTROL,
            HeaderName::from_static("mcp-protocol-version"),
        ])
        .max_age(std::time::Duration::from_secs(3600));

    Router::new()
        .route("/mcp/ping", get(mcp::mcp_ping_handler))
        .route("/mcp/{name}/sse", get(mcp::mcp_sse_handler))
        .route("/mcp/{name}/message", post(mcp::mcp_message_handler))
        .with_state(router)
        .layer(cors_layer)
}
