pub mod extract;
pub mod health_handlers;
pub mod plugin_handlers;
pub mod server_handlers;
pub mod tool_handlers;
