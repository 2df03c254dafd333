//! Protocol engine capability
//!
//! Every [`McpServerInstance`](crate::mcp::McpServerInstance) owns exactly one
//! engine. The registry and router only ever talk to the engine through the
//! [`ProtocolEngine`] trait, so the transport can be swapped or mocked without
//! touching name resolution or lifecycle code.

use crate::models::ToolSpec;
use async_trait::async_trait;
use axum::{extract::Request, response::Response};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Engine has been shut down")]
    ShutDown,

    #[error("Tool not registered: {0}")]
    ToolNotFound(String),

    #[error("Invalid tool definition: {0}")]
    InvalidTool(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Health check failed: {0}")]
    Unhealthy(String),

    #[error("Health check timed out after {0:?}")]
    Timeout(Duration),
}

/// Streaming protocol implementation bound to one instance
///
/// `serve_connection` and `serve_message` receive the raw inbound HTTP request
/// exactly as it arrived at `/mcp/{name}/...`. The returned response may carry
/// a body that keeps streaming long after the call returns; its lifetime
/// belongs to the engine, not to the caller.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProtocolEngine: Send + Sync {
    /// Called when the owning instance transitions to `Running`
    async fn start(&self) -> Result<(), EngineError>;

    /// Called when the owning instance transitions to `Stopped`
    ///
    /// Must not tear down already established connections.
    async fn stop(&self) -> Result<(), EngineError>;

    async fn serve_connection(&self, request: Request) -> Result<Response, EngineError>;

    async fn serve_message(&self, request: Request) -> Result<Response, EngineError>;

    /// Registers a tool; it is dispatchable once this returns `Ok`
    async fn add_tool(&self, tool: ToolSpec) -> Result<(), EngineError>;

    async fn delete_tool(&self, name: &str) -> Result<(), EngineError>;

    /// Lightweight liveness check against the engine's connect endpoint
    async fn ping(&self) -> Result<(), EngineError>;

    /// Releases transport resources and ends the event streams it handed out
    async fn shutdown(&self);
}

/// Identity of the instance an engine is built for
#[derive(Debug, Clone)]
pub struct EngineSpec {
    pub name: String,
    pub description: String,
    pub version: String,
}

/// Builds one engine per created instance
///
/// Called while the registry holds its structural write lock, so
/// implementations must not block.
pub trait EngineFactory: Send + Sync {
    fn build(&self, spec: &EngineSpec) -> Result<Arc<dyn ProtocolEngine>, EngineError>;
}
