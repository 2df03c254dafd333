//! Name resolution and state gating for protocol traffic
//!
//! The router never interprets MCP messages. It resolves `/mcp/{name}/...`
//! to a registered instance, refuses traffic for missing or stopped
//! instances, and otherwise hands the raw request to the instance's engine.

use crate::mcp::engine::EngineError;
use crate::mcp::registry::{ListFilter, RegistryError, SharedRegistry};
use axum::{extract::Request, response::Response};
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_PING_TIMEOUT: Duration = Duration::from_secs(3);

pub struct InstanceRouter {
    registry: SharedRegistry,
    ping_timeout: Duration,
}

pub type SharedRouter = Arc<InstanceRouter>;

impl InstanceRouter {
    pub fn new(registry: SharedRegistry, ping_timeout: Duration) -> Self {
        Self {
            registry,
            ping_timeout,
        }
    }

    pub fn registry(&self) -> &SharedRegistry {
        &self.registry
    }

    /// Dispatches a streaming connection request
    ///
    /// Neither the registry lock nor the instance lock is held while the
    /// engine serves the connection.
    pub async fn route_connect(
        &self,
        name: &str,
        request: Request,
    ) -> Result<Response, RegistryError> {
        let instance = self.registry.get(name).await?;
        instance.ensure_running().await?;

        tracing::debug!(server = %name, "Dispatching SSE connection");
        instance
            .engine()
            .serve_connection(request)
            .await
            .map_err(|e| RegistryError::upstream(name, e))
    }

    /// Dispatches one message for an established session
    pub async fn route_message(
        &self,
        name: &str,
        request: Request,
    ) -> Result<Response, RegistryError> {
        let instance = self.registry.get(name).await?;
        instance.ensure_running().await?;

        tracing::debug!(server = %name, "Dispatching message");
        instance
            .engine()
            .serve_message(request)
            .await
            .map_err(|e| RegistryError::upstream(name, e))
    }

    /// Probes every registered instance, running or not
    ///
    /// Each probe is bounded by the ping timeout; a timeout counts as a
    /// failure. The first failure is returned without probing the rest.
    pub async fn route_ping(&self) -> Result<(), RegistryError> {
        for instance in self.registry.list(ListFilter::All).await {
            let engine = instance.engine();
            match tokio::time::timeout(self.ping_timeout, engine.ping()).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::warn!(server = %instance.name, error = %e, "Ping failed");
                    return Err(RegistryError::upstream(&instance.name, e));
                }
                Err(_) => {
                    tracing::warn!(server = %instance.name, "Ping timed out");
                    return Err(RegistryError::upstream(
                        &instance.name,
                        EngineError::Timeout(self.ping_timeout),
                    ));
                }
            }
        }
        Ok(())
    }
}
