pub mod lifecycle_service;
pub mod plugin_store;

pub use lifecycle_service::{LifecycleError, LifecycleService};
pub use plugin_store::{PluginStore, PluginStoreError, StoredArtifact};
