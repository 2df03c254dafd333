//! MCP ServerHandler for hosted instances
//!
//! One [`OmcpService`] value describes the identity of a hosted server and
//! shares its tool table with the owning engine. Every SSE session gets a
//! clone, so `tools/list` and `tools/call` always see the current table.

use crate::mcp::engine::EngineError;
use crate::models::{ToolHandler, ToolSpec};
use rmcp::handler::server::ServerHandler;
use rmcp::model::{
    CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam,
    ProtocolVersion, ServerCapabilities, ServerInfo, Tool,
};
use rmcp::service::{RequestContext, RoleServer};
use rmcp::ErrorData as McpError;
use std::future::Future;
use std::sync::{Arc, RwLock};

/// A registered tool: its MCP definition and the handler serving it
#[derive(Clone)]
struct HostedTool {
    definition: Tool,
    handler: ToolHandler,
}

#[derive(Clone)]
pub struct OmcpService {
    name: String,
    version: String,
    description: String,
    tools: Arc<RwLock<Vec<HostedTool>>>,
}

impl OmcpService {
    pub fn new(name: String, version: String, description: String) -> Self {
        Self {
            name,
            version,
            description,
            tools: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Turns a tool spec into its MCP tool definition
    ///
    /// # Errors
    ///
    /// Returns the offending tool name when its input schema is not a JSON
    /// object.
    pub fn tool_definition(spec: &ToolSpec) -> Result<Tool, String> {
        let schema_map = match &spec.descriptor.input_schema {
            serde_json::Value::Object(map) => map.clone(),
            _ => return Err(spec.descriptor.name.clone()),
        };

        let description = if spec.descriptor.desc.is_empty() {
            None
        } else {
            Some(spec.descriptor.desc.clone().into())
        };

        Ok(Tool {
            name: spec.descriptor.name.clone().into(),
            description,
            input_schema: Arc::new(schema_map),
            annotations: None,
            title: None,
            icons: None,
            output_schema: None,
        })
    }

    fn write_tools(
        &self,
    ) -> Result<std::sync::RwLockWriteGuard<'_, Vec<HostedTool>>, EngineError> {
        self.tools
            .write()
            .map_err(|_| EngineError::Transport("tool table lock poisoned".to_string()))
    }

    /// Adds a tool, replacing any tool registered under the same name
    pub fn register_tool(&self, spec: &ToolSpec) -> Result<(), EngineError> {
        let definition = Self::tool_definition(spec).map_err(|name| {
            EngineError::InvalidTool(format!("input schema of {} is not an object", name))
        })?;
        let mut tools = self.write_tools()?;
        tools.retain(|t| t.definition.name != definition.name);
        tools.push(HostedTool {
            definition,
            handler: spec.handler.clone(),
        });
        Ok(())
    }

    /// Removes a tool; returns whether it was registered
    pub fn remove_tool(&self, name: &str) -> Result<bool, EngineError> {
        let mut tools = self.write_tools()?;
        let before = tools.len();
        tools.retain(|t| t.definition.name.as_ref() != name);
        Ok(tools.len() != before)
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.tools
            .read()
            .map(|tools| {
                tools
                    .iter()
                    .map(|t| t.definition.name.to_string())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn definitions(&self) -> Result<Vec<Tool>, McpError> {
        let tools = self
            .tools
            .read()
            .map_err(|_| McpError::internal_error("tool table lock poisoned", None))?;
        Ok(tools.iter().map(|t| t.definition.clone()).collect())
    }

    fn handler(&self, name: &str) -> Result<ToolHandler, McpError> {
        let tools = self
            .tools
            .read()
            .map_err(|_| McpError::internal_error("tool table lock poisoned", None))?;
        tools
            .iter()
            .find(|t| t.definition.name.as_ref() == name)
            .map(|t| t.handler.clone())
            .ok_or_else(|| McpError::invalid_params(format!("tool {} not found", name), None))
    }

    /// Dispatches one call against the current tool table
    pub async fn dispatch(&self, request: CallToolRequestParam) -> Result<CallToolResult, McpError> {
        let handler = self.handler(&request.name)?;
        tracing::debug!(server = %self.name, tool = %request.name, "Calling tool");
        handler(request.arguments).await
    }
}

impl std::fmt::Debug for OmcpService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OmcpService")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("tools", &self.tool_names())
            .finish()
    }
}

impl ServerHandler for OmcpService {
    fn get_info(&self) -> ServerInfo {
        let instructions = if self.description.is_empty() {
            format!("OMCP server {}", self.name)
        } else {
            self.description.clone()
        };

        ServerInfo {
            protocol_version: ProtocolVersion::default(),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: self.name.clone(),
                version: self.version.clone(),
                title: None,
                website_url: None,
                icons: None,
            },
            instructions: Some(instructions),
        }
    }

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<ListToolsResult, McpError>> + Send + '_ {
        std::future::ready(self.definitions().map(ListToolsResult::with_all_items))
    }

    fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<CallToolResult, McpError>> + Send + '_ {
        self.dispatch(request)
    }
}
