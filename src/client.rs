//! HTTP client for the lifecycle API
//!
//! Used by `omcp-cli`; every method maps to one endpoint and decodes the
//! `{"success": false, "message"}` envelope into [`ClientError::Rejected`].
//!
//! # Example
//!
//! ```rust,no_run
//! use omcp::client::OmcpClient;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OmcpClient::new("http://localhost:8080");
//! client.ready().await?;
//! client.create_server("weather", "Weather tools", "1.0.0").await?;
//! client.start_server("weather").await?;
//! for server in client.list_servers(true).await? {
//!     println!("{} {}", server.name, server.state);
//! }
//! # Ok(())
//! # }
//! ```

use crate::models::{
    CreateServerRequest, CreateServerResponse, InstanceSnapshot, ListServersResponse,
    ListToolsResponse, LoadPluginResponse, ServerNameRequest, StatusResponse, ToolDescriptor,
};
use reqwest::{multipart, StatusCode};
use serde::de::DeserializeOwned;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_HOST: &str = "http://localhost:8080";

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{message} (HTTP {status})")]
    Rejected { status: StatusCode, message: String },

    #[error("Unexpected HTTP status: {0}")]
    Status(StatusCode),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone)]
pub struct OmcpClient {
    base_url: String,
    client: reqwest::Client,
}

impl OmcpClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Probes `/ready`; any non-2xx answer or transport failure is an error
    pub async fn ready(&self) -> Result<(), ClientError> {
        let response = self.client.get(self.url("/ready")).send().await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(ClientError::Status(response.status()))
        }
    }

    pub async fn create_server(
        &self,
        name: &str,
        desc: &str,
        version: &str,
    ) -> Result<Option<InstanceSnapshot>, ClientError> {
        let request = CreateServerRequest {
            name: name.to_string(),
            desc: desc.to_string(),
            version: version.to_string(),
        };
        let response = self
            .client
            .post(self.url("/api/server/create"))
            .json(&request)
            .send()
            .await?;
        let body: CreateServerResponse = decode(response).await?;
        Ok(body.server)
    }

    pub async fn delete_server(&self, name: &str) -> Result<(), ClientError> {
        self.post_name("/api/server/delete", name).await
    }

    pub async fn start_server(&self, name: &str) -> Result<(), ClientError> {
        self.post_name("/api/server/start", name).await
    }

    pub async fn stop_server(&self, name: &str) -> Result<(), ClientError> {
        self.post_name("/api/server/stop", name).await
    }

    pub async fn list_servers(&self, is_alive: bool) -> Result<Vec<InstanceSnapshot>, ClientError> {
        let response = self
            .client
            .get(self.url("/api/server/list"))
            .query(&[("is_alive", is_alive)])
            .send()
            .await?;
        let body: ListServersResponse = decode(response).await?;
        Ok(body.servers)
    }

    pub async fn list_tools(&self, server: &str) -> Result<Vec<ToolDescriptor>, ClientError> {
        let response = self
            .client
            .get(self.url("/api/tool/list"))
            .query(&[("server", server)])
            .send()
            .await?;
        let body: ListToolsResponse = decode(response).await?;
        Ok(body.tools)
    }

    /// Uploads a plugin artifact from disk
    pub async fn load_plugin(
        &self,
        path: &Path,
        servers: &[String],
    ) -> Result<LoadPluginResponse, ClientError> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "plugin".to_string());

        let part = multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("application/octet-stream")?;
        let mut form = multipart::Form::new().part("plugin_file", part);
        for server in servers {
            form = form.text("servers", server.clone());
        }

        let response = self
            .client
            .post(self.url("/api/load"))
            .multipart(form)
            .send()
            .await?;
        decode(response).await
    }

    async fn post_name(&self, path: &str, name: &str) -> Result<(), ClientError> {
        let response = self
            .client
            .post(self.url(path))
            .json(&ServerNameRequest {
                name: name.to_string(),
            })
            .send()
            .await?;
        let _: StatusResponse = decode(response).await?;
        Ok(())
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json::<T>().await?);
    }

    match response.json::<StatusResponse>().await {
        Ok(body) => Err(ClientError::Rejected {
            status,
            message: body.message,
        }),
        Err(_) => Err(ClientError::Status(status)),
    }
}
