use omcp::{app, config::ServerConfig, demo, mcp, services::PluginStore, AppState};

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "omcp=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env()?;

    // Initialize MCP registry
    let factory = Arc::new(mcp::SseEngineFactory::new(config.sse_keep_alive));
    let registry: mcp::SharedRegistry = Arc::new(mcp::McpServerRegistry::new(factory));

    if config.seed_demo {
        if let Err(e) = demo::seed(&registry).await {
            tracing::warn!("Failed to seed demo server: {}", e);
        }
    }

    let app_state = AppState::new(
        registry.clone(),
        PluginStore::new(config.plugin_dir.clone()),
        config.ping_timeout,
    );
    let app = app::build_app(app_state, config.max_plugin_bytes);

    let addr = config.socket_addr();
    tracing::info!("Server running on http://{}", addr);
    tracing::info!(plugin_dir = %config.plugin_dir.display(), "Plugin uploads enabled");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(app::shutdown_on(ctrl_c(), registry))
        .await?;

    Ok(())
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
