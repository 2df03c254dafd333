use crate::models::{ResourceDescriptor, ToolDescriptor};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_SERVER_VERSION: &str = "0.0.1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstanceState {
    Stopped,
    Running,
}

impl InstanceState {
    pub fn as_str(&self) -> &'static str {
        match self {
            InstanceState::Stopped => "stopped",
            InstanceState::Running => "running",
        }
    }
}

impl fmt::Display for InstanceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time copy of an instance, as returned by the lifecycle API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceSnapshot {
    pub name: String,
    pub desc: String,
    pub version: String,
    pub state: InstanceState,
    #[serde(default)]
    pub tools: Vec<ToolDescriptor>,
    #[serde(default)]
    pub resources: Vec<ResourceDescriptor>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Request/response shapes for the lifecycle API

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateServerRequest {
    pub name: String,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateServerResponse {
    pub success: bool,
    pub message: String,
    pub server: Option<InstanceSnapshot>,
}

/// Body of delete/start/stop requests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerNameRequest {
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListServersQuery {
    #[serde(default)]
    pub is_alive: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListServersResponse {
    pub servers: Vec<InstanceSnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListToolsQuery {
    pub server: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListToolsResponse {
    pub total: i64,
    pub tools: Vec<ToolDescriptor>,
}

/// Generic `{success, message}` envelope shared by most lifecycle calls
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub success: bool,
    pub message: String,
}

impl StatusResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            message: "success".to_string(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadPluginResponse {
    pub success: bool,
    pub message: String,
    pub file_name: Option<String>,
    pub sha256: Option<String>,
    pub size: Option<u64>,
    #[serde(default)]
    pub servers: Vec<String>,
}
