use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use rmcp::model::CallToolResult;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map as JsonMap, Value as JsonValue};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

// Hardcoded regex pattern - guaranteed to be valid at compile time
#[allow(clippy::unwrap_used)]
static TOOL_NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_.-]{0,127}$").unwrap());

/// Tool metadata as recorded on an instance and reported by `ListTools`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub desc: String,
    #[serde(default = "default_input_schema")]
    pub input_schema: JsonValue,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_input_schema() -> JsonValue {
    json!({ "type": "object", "properties": {} })
}

impl ToolDescriptor {
    pub fn new(name: impl Into<String>, desc: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            desc: desc.into(),
            input_schema: default_input_schema(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_input_schema(mut self, schema: JsonValue) -> Self {
        self.input_schema = schema;
        self
    }

    pub fn has_valid_name(&self) -> bool {
        TOOL_NAME_PATTERN.is_match(&self.name)
    }
}

pub type ToolFuture = Pin<Box<dyn Future<Output = Result<CallToolResult, rmcp::ErrorData>> + Send>>;

/// Executes one tool call with the arguments supplied by the MCP client
pub type ToolHandler = Arc<dyn Fn(Option<JsonMap<String, JsonValue>>) -> ToolFuture + Send + Sync>;

/// A tool descriptor paired with the handler that serves its calls
#[derive(Clone)]
pub struct ToolSpec {
    pub descriptor: ToolDescriptor,
    pub handler: ToolHandler,
}

impl ToolSpec {
    pub fn new<F, Fut>(descriptor: ToolDescriptor, handler: F) -> Self
    where
        F: Fn(Option<JsonMap<String, JsonValue>>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<CallToolResult, rmcp::ErrorData>> + Send + 'static,
    {
        Self {
            descriptor,
            handler: Arc::new(move |args| Box::pin(handler(args))),
        }
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }
}

impl fmt::Debug for ToolSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolSpec")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}
