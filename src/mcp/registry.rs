//! Thread-safe MCP server registry
//!
//! Manages creation, deletion, lookup and enumeration of named MCP server
//! instances. The name → instance map sits behind a `tokio::sync::RwLock`;
//! per-instance state has its own lock inside [`McpServerInstance`], so the
//! structural lock is only ever held for the map operation itself.

use crate::mcp::engine::{EngineError, EngineFactory, EngineSpec};
use crate::mcp::instance::McpServerInstance;
use crate::models::DEFAULT_SERVER_VERSION;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

// Instance names become a path segment under /mcp/
#[allow(clippy::unwrap_used)]
static SERVER_NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.-]{0,63}$").unwrap());

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Server already exists: {0}")]
    AlreadyExists(String),

    #[error("Server not found: {0}")]
    NotFound(String),

    #[error("Server is not running: {0}")]
    NotRunning(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Upstream failure in {name}: {source}")]
    Upstream {
        name: String,
        #[source]
        source: EngineError,
    },
}

impl RegistryError {
    pub fn upstream(name: &str, source: EngineError) -> Self {
        RegistryError::Upstream {
            name: name.to_string(),
            source,
        }
    }
}

/// Which instances [`McpServerRegistry::list`] returns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListFilter {
    All,
    RunningOnly,
}

impl ListFilter {
    pub fn from_alive_flag(is_alive: bool) -> Self {
        if is_alive {
            ListFilter::RunningOnly
        } else {
            ListFilter::All
        }
    }
}

/// Registry of MCP server instances indexed by name
///
/// Created once at process start and shared as [`SharedRegistry`] with the
/// router, the lifecycle service and the HTTP handlers.
pub struct McpServerRegistry {
    instances: RwLock<HashMap<String, Arc<McpServerInstance>>>,
    factory: Arc<dyn EngineFactory>,
}

pub type SharedRegistry = Arc<McpServerRegistry>;

impl McpServerRegistry {
    /// Creates a new empty registry
    pub fn new(factory: Arc<dyn EngineFactory>) -> Self {
        Self {
            instances: RwLock::new(HashMap::new()),
            factory,
        }
    }

    /// Creates and registers a new instance in the `Stopped` state
    ///
    /// The existence check, engine construction and insertion happen under a
    /// single write lock, so no reader can observe a half-built entry.
    ///
    /// # Returns
    ///
    /// * `Ok(Arc<McpServerInstance>)` - Instance created
    /// * `Err(RegistryError::InvalidRequest)` - Name is not a valid path segment
    /// * `Err(RegistryError::AlreadyExists)` - Name is taken
    /// * `Err(RegistryError::Upstream)` - Engine construction failed
    pub async fn create(
        &self,
        name: &str,
        description: &str,
        version: &str,
    ) -> Result<Arc<McpServerInstance>, RegistryError> {
        if !SERVER_NAME_PATTERN.is_match(name) {
            return Err(RegistryError::InvalidRequest(format!(
                "invalid server name: {:?}",
                name
            )));
        }
        let version = if version.trim().is_empty() {
            DEFAULT_SERVER_VERSION
        } else {
            version
        };

        let mut instances = self.instances.write().await;
        if instances.contains_key(name) {
            return Err(RegistryError::AlreadyExists(name.to_string()));
        }

        let spec = EngineSpec {
            name: name.to_string(),
            description: description.to_string(),
            version: version.to_string(),
        };
        let engine = self
            .factory
            .build(&spec)
            .map_err(|e| RegistryError::upstream(name, e))?;

        let instance = Arc::new(McpServerInstance::new(
            spec.name,
            spec.description,
            spec.version,
            engine,
        ));
        instances.insert(name.to_string(), Arc::clone(&instance));

        tracing::info!(server = %name, "Created MCP server");
        Ok(instance)
    }

    /// Removes an instance regardless of its state
    ///
    /// The engine is not shut down: connections it already serves run to
    /// completion on their own, while new routing attempts get `NotFound`.
    pub async fn delete(&self, name: &str) -> Result<(), RegistryError> {
        self.instances
            .write()
            .await
            .remove(name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))?;

        tracing::info!(server = %name, "Deleted MCP server");
        Ok(())
    }

    pub async fn get(&self, name: &str) -> Result<Arc<McpServerInstance>, RegistryError> {
        self.instances
            .read()
            .await
            .get(name)
            .map(Arc::clone)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }

    /// Returns a snapshot of the registered instances
    ///
    /// Order is unspecified. With [`ListFilter::RunningOnly`] the state of
    /// each entry is checked after the structural lock has been released.
    pub async fn list(&self, filter: ListFilter) -> Vec<Arc<McpServerInstance>> {
        let entries: Vec<_> = self.instances.read().await.values().cloned().collect();

        match filter {
            ListFilter::All => entries,
            ListFilter::RunningOnly => {
                let mut running = Vec::with_capacity(entries.len());
                for instance in entries {
                    if instance.is_running().await {
                        running.push(instance);
                    }
                }
                running
            }
        }
    }

    pub async fn len(&self) -> usize {
        self.instances.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.instances.read().await.is_empty()
    }

    /// Shuts down all registered engines and empties the registry
    ///
    /// Only used when the process is exiting.
    pub async fn shutdown_all(&self) {
        let instances: Vec<_> = self.instances.write().await.drain().collect();

        for (name, instance) in instances {
            instance.engine().shutdown().await;
            tracing::debug!(server = %name, "Shut down MCP server engine");
        }
    }
}
