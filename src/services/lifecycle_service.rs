use crate::mcp::registry::{ListFilter, RegistryError, SharedRegistry};
use crate::models::{InstanceSnapshot, ToolDescriptor, ToolSpec};
use crate::services::plugin_store::{PluginStore, PluginStoreError, StoredArtifact};

#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Plugin(#[from] PluginStoreError),
}

/// Lifecycle operations exposed to external callers
///
/// Every method is a single registry or instance call; the service keeps no
/// state of its own beyond its collaborators.
#[derive(Clone)]
pub struct LifecycleService {
    registry: SharedRegistry,
    plugins: PluginStore,
}

impl LifecycleService {
    pub fn new(registry: SharedRegistry, plugins: PluginStore) -> Self {
        Self { registry, plugins }
    }

    // Server operations
    pub async fn create_server(
        &self,
        name: &str,
        description: &str,
        version: &str,
    ) -> Result<InstanceSnapshot, LifecycleError> {
        let instance = self.registry.create(name, description, version).await?;
        Ok(instance.snapshot().await)
    }

    pub async fn delete_server(&self, name: &str) -> Result<(), LifecycleError> {
        self.registry.delete(name).await?;
        Ok(())
    }

    pub async fn list_servers(&self, is_alive: bool) -> Vec<InstanceSnapshot> {
        let instances = self
            .registry
            .list(ListFilter::from_alive_flag(is_alive))
            .await;

        let mut snapshots = Vec::with_capacity(instances.len());
        for instance in instances {
            snapshots.push(instance.snapshot().await);
        }
        snapshots
    }

    pub async fn start_server(&self, name: &str) -> Result<(), LifecycleError> {
        self.registry.get(name).await?.start().await?;
        Ok(())
    }

    pub async fn stop_server(&self, name: &str) -> Result<(), LifecycleError> {
        self.registry.get(name).await?.stop().await?;
        Ok(())
    }

    // Tool operations
    pub async fn list_tools(&self, server: &str) -> Result<Vec<ToolDescriptor>, LifecycleError> {
        Ok(self.registry.get(server).await?.list_tools().await)
    }

    pub async fn add_tools(&self, server: &str, tools: Vec<ToolSpec>) -> Result<(), LifecycleError> {
        self.registry.get(server).await?.add_tools(tools).await?;
        Ok(())
    }

    pub async fn delete_tool(&self, server: &str, tool: &str) -> Result<(), LifecycleError> {
        self.registry.get(server).await?.delete_tool(tool).await?;
        Ok(())
    }

    /// Stores an uploaded plugin artifact
    ///
    /// Every named target server must exist; the artifact is only recorded,
    /// never loaded into an engine.
    pub async fn load_plugin(
        &self,
        file_name: &str,
        payload: &[u8],
        servers: &[String],
    ) -> Result<StoredArtifact, LifecycleError> {
        for server in servers {
            self.registry.get(server).await?;
        }
        Ok(self.plugins.store(file_name, payload).await?)
    }
}
