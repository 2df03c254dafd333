//! Built-in demonstration server
//!
//! Seeds a running `hello` instance carrying a single `hello_world` tool so a
//! fresh daemon has something to connect an MCP client to.

use crate::mcp::registry::{McpServerRegistry, RegistryError};
use crate::models::{ToolDescriptor, ToolSpec};
use rmcp::model::{CallToolResult, Content, ErrorCode};
use serde_json::json;

pub const DEMO_SERVER_NAME: &str = "hello";
pub const DEMO_TOOL_NAME: &str = "hello_world";

/// `hello_world`: greets the person named by the `name` argument
pub fn hello_world_tool() -> ToolSpec {
    let descriptor = ToolDescriptor::new(DEMO_TOOL_NAME, "Say hello to someone").with_input_schema(
        json!({
            "type": "object",
            "properties": {
                "name": {
                    "type": "string",
                    "description": "Name of the person to greet"
                }
            },
            "required": ["name"]
        }),
    );

    ToolSpec::new(descriptor, |args| async move {
        let name = args
            .as_ref()
            .and_then(|a| a.get("name"))
            .and_then(|v| v.as_str())
            .ok_or_else(|| rmcp::ErrorData {
                code: ErrorCode::INVALID_PARAMS,
                message: "name must be a string".into(),
                data: None,
            })?;

        Ok(CallToolResult::success(vec![Content::text(format!(
            "Hello, {}!",
            name
        ))]))
    })
}

/// Creates and starts the demo instance
pub async fn seed(registry: &McpServerRegistry) -> Result<(), RegistryError> {
    let instance = registry
        .create(DEMO_SERVER_NAME, "Demo server", "1.0.0")
        .await?;
    instance.add_tools(vec![hello_world_tool()]).await?;
    instance.start().await?;

    tracing::info!(server = DEMO_SERVER_NAME, "Seeded demo server");
    Ok(())
}
