pub mod app;
pub mod client;
pub mod config;
pub mod demo;
pub mod error;
pub mod handlers;
pub mod mcp;
pub mod models;
pub mod services;

// Make test_utils available for both unit tests and integration tests
pub mod test_utils;

use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub lifecycle: Arc<services::LifecycleService>,
    pub router: mcp::SharedRouter,
}

impl AppState {
    /// Wires the lifecycle service and instance router around one registry
    pub fn new(
        registry: mcp::SharedRegistry,
        plugins: services::PluginStore,
        ping_timeout: std::time::Duration,
    ) -> Self {
        Self {
            lifecycle: Arc::new(services::LifecycleService::new(registry.clone(), plugins)),
            router: Arc::new(mcp::InstanceRouter::new(registry, ping_timeout)),
        }
    }
}
