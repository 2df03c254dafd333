//! Named MCP server hosting
//!
//! This module keeps a registry of independently named MCP servers and routes
//! protocol traffic to them by name.
//!
//! # Architecture
//!
//! - [`McpServerRegistry`] - Thread-safe name → instance directory
//! - [`McpServerInstance`] - One server's metadata, lifecycle state and engine
//! - [`InstanceRouter`] - Name resolution and state gating for protocol traffic
//! - [`ProtocolEngine`] - Transport capability each instance delegates to
//! - [`SseEngine`] - rmcp SSE implementation of [`ProtocolEngine`]
//! - [`mcp_sse_handler`] and [`mcp_message_handler`] - HTTP request dispatchers
//!
//! # Example
//!
//! ```rust,no_run
//! use omcp::mcp::{InstanceRouter, McpServerRegistry, SseEngineFactory};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = Arc::new(McpServerRegistry::new(Arc::new(SseEngineFactory::default())));
//! let router = InstanceRouter::new(registry.clone(), Duration::from_secs(3));
//!
//! let instance = registry.create("weather", "Weather tools", "1.0.0").await?;
//! instance.start().await?;
//! router.route_ping().await?;
//! # Ok(())
//! # }
//! ```

pub mod engine;
pub mod handlers;
pub mod instance;
pub mod registry;
pub mod router;
pub mod service;
pub mod sse_engine;

pub use engine::{EngineError, EngineFactory, EngineSpec, ProtocolEngine};
pub use handlers::{mcp_message_handler, mcp_ping_handler, mcp_sse_handler};
pub use instance::McpServerInstance;
pub use registry::{ListFilter, McpServerRegistry, RegistryError, SharedRegistry};
pub use router::{InstanceRouter, SharedRouter};
pub use service::OmcpService;
pub use sse_engine::{SseEngine, SseEngineFactory};
