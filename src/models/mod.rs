pub mod resource;
pub mod server;
pub mod tool;

pub use resource::ResourceDescriptor;
pub use server::{
    CreateServerRequest, CreateServerResponse, InstanceSnapshot, InstanceState,
    ListServersQuery, ListServersResponse, ListToolsQuery, ListToolsResponse, LoadPluginResponse,
    ServerNameRequest, StatusResponse, DEFAULT_SERVER_VERSION,
};
pub use tool::{ToolDescriptor, ToolFuture, ToolHandler, ToolSpec};
