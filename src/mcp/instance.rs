//! MCP server instance management
//!
//! Each [`McpServerInstance`] holds the metadata and lifecycle state of one
//! named server together with the protocol engine that serves its traffic.
//! Mutable fields live behind a per-instance lock so lifecycle calls on
//! different instances never contend with each other.

use crate::mcp::engine::ProtocolEngine;
use crate::mcp::registry::RegistryError;
use crate::models::{InstanceSnapshot, InstanceState, ResourceDescriptor, ToolDescriptor, ToolSpec};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;

struct InstanceInner {
    state: InstanceState,
    tools: Vec<ToolDescriptor>,
    resources: Vec<ResourceDescriptor>,
    updated_at: DateTime<Utc>,
}

impl InstanceInner {
    fn touch(&mut self) {
        self.updated_at = Utc::now().max(self.updated_at);
    }
}

/// Individual MCP server instance
///
/// `name`, `description`, `version` and `created_at` are fixed at creation.
/// Everything else changes only through the lifecycle methods below, each of
/// which runs under the instance lock and refreshes `updated_at` on success.
pub struct McpServerInstance {
    pub name: String,
    pub description: String,
    pub version: String,
    pub created_at: DateTime<Utc>,
    engine: Arc<dyn ProtocolEngine>,
    inner: Mutex<InstanceInner>,
}

impl std::fmt::Debug for McpServerInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("McpServerInstance")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("version", &self.version)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

impl McpServerInstance {
    /// Creates a new instance in the `Stopped` state
    pub fn new(
        name: String,
        description: String,
        version: String,
        engine: Arc<dyn ProtocolEngine>,
    ) -> Self {
        let now = Utc::now();
        Self {
            name,
            description,
            version,
            created_at: now,
            engine,
            inner: Mutex::new(InstanceInner {
                state: InstanceState::Stopped,
                tools: Vec::new(),
                resources: Vec::new(),
                updated_at: now,
            }),
        }
    }

    pub async fn state(&self) -> InstanceState {
        self.inner.lock().await.state
    }

    pub async fn is_running(&self) -> bool {
        self.state().await == InstanceState::Running
    }

    pub async fn updated_at(&self) -> DateTime<Utc> {
        self.inner.lock().await.updated_at
    }

    /// Fails with [`RegistryError::NotRunning`] unless the instance is `Running`
    pub async fn ensure_running(&self) -> Result<(), RegistryError> {
        if self.is_running().await {
            Ok(())
        } else {
            Err(RegistryError::NotRunning(self.name.clone()))
        }
    }

    /// Transitions to `Running`
    ///
    /// Idempotent: starting a running instance only refreshes `updated_at`.
    /// The engine is notified only on an actual transition.
    pub async fn start(&self) -> Result<(), RegistryError> {
        let mut inner = self.inner.lock().await;
        if inner.state == InstanceState::Stopped {
            self.engine
                .start()
                .await
                .map_err(|e| RegistryError::upstream(&self.name, e))?;
            inner.state = InstanceState::Running;
            tracing::info!(server = %self.name, "MCP server started");
        }
        inner.touch();
        Ok(())
    }

    /// Transitions to `Stopped`
    ///
    /// Only new traffic is rejected afterwards; streams that are already
    /// attached to the engine keep running.
    pub async fn stop(&self) -> Result<(), RegistryError> {
        let mut inner = self.inner.lock().await;
        if inner.state == InstanceState::Running {
            self.engine
                .stop()
                .await
                .map_err(|e| RegistryError::upstream(&self.name, e))?;
            inner.state = InstanceState::Stopped;
            tracing::info!(server = %self.name, "MCP server stopped");
        }
        inner.touch();
        Ok(())
    }

    /// Registers tools with the engine and records them in order
    ///
    /// Names are validated up front: a batch containing an invalid name, a
    /// duplicate, or a name that is already registered is rejected as a
    /// whole. If the engine fails midway, the tools registered before the
    /// failure stay recorded.
    pub async fn add_tools(&self, tools: Vec<ToolSpec>) -> Result<(), RegistryError> {
        if tools.is_empty() {
            return Ok(());
        }

        let mut inner = self.inner.lock().await;

        let mut seen: HashSet<&str> = inner.tools.iter().map(|t| t.name.as_str()).collect();
        for tool in &tools {
            if !tool.descriptor.has_valid_name() {
                return Err(RegistryError::InvalidRequest(format!(
                    "invalid tool name: {:?}",
                    tool.name()
                )));
            }
            if !seen.insert(tool.name()) {
                return Err(RegistryError::InvalidRequest(format!(
                    "tool already registered: {}",
                    tool.name()
                )));
            }
        }
        drop(seen);

        for tool in tools {
            let descriptor = tool.descriptor.clone();
            let result = self.engine.add_tool(tool).await;
            if let Err(e) = result {
                inner.touch();
                return Err(RegistryError::upstream(&self.name, e));
            }
            tracing::debug!(server = %self.name, tool = %descriptor.name, "Registered tool");
            inner.tools.push(descriptor);
        }
        inner.touch();
        Ok(())
    }

    pub async fn add_resources(&self, resources: Vec<ResourceDescriptor>) {
        if resources.is_empty() {
            return;
        }
        let mut inner = self.inner.lock().await;
        inner.resources.extend(resources);
        inner.touch();
    }

    /// Unregisters a tool from the engine and drops it from the recorded list
    ///
    /// The recorded list reflects the tools that are currently active.
    pub async fn delete_tool(&self, name: &str) -> Result<(), RegistryError> {
        let mut inner = self.inner.lock().await;
        let position = inner
            .tools
            .iter()
            .position(|t| t.name == name)
            .ok_or_else(|| RegistryError::NotFound(format!("{}/{}", self.name, name)))?;

        self.engine
            .delete_tool(name)
            .await
            .map_err(|e| RegistryError::upstream(&self.name, e))?;

        inner.tools.remove(position);
        inner.touch();
        tracing::debug!(server = %self.name, tool = %name, "Deleted tool");
        Ok(())
    }

    pub async fn list_tools(&self) -> Vec<ToolDescriptor> {
        self.inner.lock().await.tools.clone()
    }

    pub async fn snapshot(&self) -> InstanceSnapshot {
        let inner = self.inner.lock().await;
        InstanceSnapshot {
            name: self.name.clone(),
            desc: self.description.clone(),
            version: self.version.clone(),
            state: inner.state,
            tools: inner.tools.clone(),
            resources: inner.resources.clone(),
            created_at: self.created_at,
            updated_at: inner.updated_at,
        }
    }

    /// Returns the engine serving this instance
    pub fn engine(&self) -> Arc<dyn ProtocolEngine> {
        Arc::clone(&self.engine)
    }
}
